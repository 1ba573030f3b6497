//! Multi-head output decoding.
//!
//! The model emits four categorical distributions followed by one attention
//! scalar. Each categorical head becomes `{level, confidence, probabilities}`
//! where `level` is the arg-max index.

use engage_models::{HeadPrediction, ModelInfo, ModelType, PredictionHead, PredictionResult, OUTPUT_HEAD_COUNT};

use crate::error::{InferenceError, InferenceResult};
use crate::predictor::{HeadTensor, RawHeadOutputs};

/// Request metadata carried into the result.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultMeta {
    pub model_type: ModelType,
    pub frames_processed: Option<usize>,
    pub model_info: Option<ModelInfo>,
}

impl ResultMeta {
    /// Metadata for a single still image.
    pub fn still() -> Self {
        Self {
            model_type: ModelType::RealTime,
            frames_processed: None,
            model_info: None,
        }
    }

    /// Metadata for a sampled video.
    pub fn video(frames_processed: usize) -> Self {
        Self {
            model_type: ModelType::Original,
            frames_processed: Some(frames_processed),
            model_info: Some(ModelInfo::attention_lstm()),
        }
    }
}

/// Decode raw head outputs into a prediction result.
pub fn decode_prediction(outputs: &RawHeadOutputs, meta: ResultMeta) -> InferenceResult<PredictionResult> {
    if outputs.len() != OUTPUT_HEAD_COUNT {
        return Err(InferenceError::malformed(format!(
            "expected {} heads, got {}",
            OUTPUT_HEAD_COUNT,
            outputs.len()
        )));
    }

    let head = |h: PredictionHead| -> InferenceResult<HeadPrediction> {
        let tensor = outputs
            .get(h.output_index())
            .ok_or_else(|| InferenceError::malformed(format!("missing {} head", h)))?;
        decode_categorical(h.as_str(), tensor)
    };

    let boredom = head(PredictionHead::Boredom)?;
    let engagement = head(PredictionHead::Engagement)?;
    let confusion = head(PredictionHead::Confusion)?;
    let frustration = head(PredictionHead::Frustration)?;

    let attention = outputs
        .get(OUTPUT_HEAD_COUNT - 1)
        .ok_or_else(|| InferenceError::malformed("missing attention head"))?;
    let values = head_values("attention", attention)?;
    let attention_score = match values {
        [score] => *score,
        _ => {
            return Err(InferenceError::malformed(format!(
                "attention head must hold one value, got {}",
                values.len()
            )))
        }
    };

    Ok(PredictionResult {
        boredom,
        engagement,
        confusion,
        frustration,
        attention_score,
        frames_processed: meta.frames_processed,
        model_type: meta.model_type,
        model_info: meta.model_info,
    })
}

/// Validate a head tensor and return its values.
///
/// Accepts `[k]` or `[1, k]`; values must be finite.
fn head_values<'a>(name: &str, tensor: &'a HeadTensor) -> InferenceResult<&'a [f32]> {
    let k = match tensor.shape.as_slice() {
        [k] => *k,
        [1, k] => *k,
        other => {
            return Err(InferenceError::malformed(format!(
                "{} head has unexpected shape {:?}",
                name, other
            )))
        }
    };

    if k < 1 || k as usize != tensor.data.len() {
        return Err(InferenceError::malformed(format!(
            "{} head shape {:?} does not match {} values",
            name,
            tensor.shape,
            tensor.data.len()
        )));
    }

    if let Some(bad) = tensor.data.iter().find(|v| !v.is_finite()) {
        return Err(InferenceError::malformed(format!("{} head contains {}", name, bad)));
    }

    Ok(&tensor.data)
}

fn decode_categorical(name: &str, tensor: &HeadTensor) -> InferenceResult<HeadPrediction> {
    let probabilities = head_values(name, tensor)?;

    // First maximum wins on ties.
    let (level, confidence) = probabilities
        .iter()
        .copied()
        .enumerate()
        .fold((0, probabilities[0]), |best, (i, p)| if p > best.1 { (i, p) } else { best });

    Ok(HeadPrediction {
        level,
        confidence,
        probabilities: probabilities.to_vec(),
    })
}
