//! ONNX Runtime backed predictor.

use std::path::Path;
use std::sync::{Arc, Mutex};

use engage_media::Batch;
use ort::session::builder::GraphOptimizationLevel;
use ort::session::Session;
use ort::value::{Tensor, Value};
use tracing::{debug, info};

use crate::error::{InferenceError, InferenceResult};
use crate::predictor::{HeadTensor, ModelLoader, Predictor, RawHeadOutputs};

/// Loads ONNX models into single-threaded ONNX Runtime sessions.
#[derive(Debug, Clone, Copy, Default)]
pub struct OrtModelLoader;

impl ModelLoader for OrtModelLoader {
    fn load(&self, path: &Path) -> InferenceResult<Arc<dyn Predictor>> {
        Ok(Arc::new(OrtPredictor::load(path)?))
    }
}

/// ONNX Runtime session wrapper.
pub struct OrtPredictor {
    session: Mutex<Session>,
    output_names: Vec<String>,
}

impl OrtPredictor {
    pub fn load(model_path: &Path) -> InferenceResult<Self> {
        let load_err = |message: String| InferenceError::model_load(model_path, message);

        if !model_path.exists() {
            return Err(load_err("model file not found".to_string()));
        }

        let model_bytes = std::fs::read(model_path).map_err(|e| load_err(format!("ORT read model file: {e}")))?;

        // One intra-op and one inter-op thread: requests are already serialized.
        let session = Session::builder()
            .map_err(|e| load_err(format!("ORT session builder: {e}")))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| load_err(format!("ORT opt level: {e}")))?
            .with_intra_threads(1)
            .map_err(|e| load_err(format!("ORT intra threads: {e}")))?
            .with_inter_threads(1)
            .map_err(|e| load_err(format!("ORT inter threads: {e}")))?
            .commit_from_memory(model_bytes.as_slice())
            .map_err(|e| load_err(format!("ORT load model: {e}")))?;

        let output_names: Vec<String> = session.outputs.iter().map(|o| o.name.clone()).collect();

        info!(
            path = %model_path.display(),
            size_bytes = model_bytes.len(),
            outputs = ?output_names,
            "Loaded ONNX model"
        );

        Ok(Self {
            session: Mutex::new(session),
            output_names,
        })
    }

    /// Declared output names, in the order heads are returned.
    pub fn output_names(&self) -> &[String] {
        &self.output_names
    }
}

impl Predictor for OrtPredictor {
    fn predict(&self, batch: Batch) -> InferenceResult<RawHeadOutputs> {
        let (shape, data) = batch.into_raw_parts();
        debug!(?shape, "Running model");

        let tensor: Value = Tensor::from_array((shape, data.into_boxed_slice()))
            .map(Value::from)
            .map_err(|e| InferenceError::inference(format!("ORT tensor: {e}")))?;

        let mut session = self
            .session
            .lock()
            .map_err(|_| InferenceError::internal("ORT session poisoned"))?;

        let outputs = session
            .run(ort::inputs![tensor])
            .map_err(|e| InferenceError::inference(format!("ORT run failed: {e}")))?;

        let mut heads = Vec::with_capacity(self.output_names.len());
        for name in &self.output_names {
            let value = outputs
                .get(name.as_str())
                .ok_or_else(|| InferenceError::malformed(format!("missing output '{name}'")))?;
            let (shape, data) = value
                .try_extract_tensor::<f32>()
                .map_err(|e| InferenceError::malformed(format!("output '{name}' is not f32: {e}")))?;
            heads.push(HeadTensor::new(shape.iter().copied().collect(), data.to_vec()));
        }

        Ok(RawHeadOutputs::new(heads))
    }
}
