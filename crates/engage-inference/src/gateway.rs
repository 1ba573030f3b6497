//! Model gateway.
//!
//! [`ModelGateway`] owns the single model handle of the process. The handle is
//! created on first use: the model file is fetched from blob storage if it is
//! not on disk, then loaded. Concurrent first calls wait on the same
//! initialization; a failed load is not remembered, so the next request
//! retries it.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use engage_media::Batch;
use engage_storage::BlobFetcher;
use tokio::sync::OnceCell;
use tracing::{error, info, warn};

use crate::config::ModelSourceConfig;
use crate::error::{InferenceError, InferenceResult};
use crate::predictor::{ModelLoader, Predictor, RawHeadOutputs};

/// Metric names recorded by the gateway.
pub mod metric_names {
    pub const MODEL_LOADS: &str = "engage_model_loads_total";
    pub const MODEL_FETCHES: &str = "engage_model_fetches_total";
    pub const INFERENCE_DURATION: &str = "engage_inference_duration_seconds";
}

/// Process-wide access point to the model.
pub struct ModelGateway {
    config: ModelSourceConfig,
    fetcher: Option<Arc<dyn BlobFetcher>>,
    loader: Arc<dyn ModelLoader>,
    model: OnceCell<Arc<dyn Predictor>>,
}

impl ModelGateway {
    pub fn new(
        config: ModelSourceConfig,
        fetcher: Option<Arc<dyn BlobFetcher>>,
        loader: Arc<dyn ModelLoader>,
    ) -> Self {
        Self {
            config,
            fetcher,
            loader,
            model: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &ModelSourceConfig {
        &self.config
    }

    /// Whether the model handle has been created.
    pub fn is_loaded(&self) -> bool {
        self.model.initialized()
    }

    /// Return the model handle, creating it on first call.
    pub async fn get_model(&self) -> InferenceResult<Arc<dyn Predictor>> {
        self.model
            .get_or_try_init(|| self.load())
            .await
            .map(Arc::clone)
    }

    /// Run the model on one batch.
    pub async fn infer(&self, batch: Batch) -> InferenceResult<RawHeadOutputs> {
        let model = self.get_model().await?;
        let start = Instant::now();

        let outputs = tokio::task::spawn_blocking(move || model.predict(batch))
            .await
            .map_err(|e| InferenceError::internal(format!("inference task failed: {e}")))??;

        metrics::histogram!(metric_names::INFERENCE_DURATION).record(start.elapsed().as_secs_f64());
        Ok(outputs)
    }

    async fn load(&self) -> InferenceResult<Arc<dyn Predictor>> {
        let path = self.config.local_path.clone();

        if !tokio::fs::try_exists(&path).await.unwrap_or(false) {
            self.fetch_model(&path).await;
        }

        let loader = Arc::clone(&self.loader);
        let load_path = path.clone();
        let result = tokio::task::spawn_blocking(move || loader.load(&load_path))
            .await
            .map_err(|e| InferenceError::internal(format!("model load task failed: {e}")))?;

        match &result {
            Ok(_) => {
                metrics::counter!(metric_names::MODEL_LOADS, "status" => "success").increment(1);
                info!(path = %path.display(), "Model loaded");
            }
            Err(e) => {
                metrics::counter!(metric_names::MODEL_LOADS, "status" => "error").increment(1);
                error!(path = %path.display(), error = %e, "Model load failed");
            }
        }

        result
    }

    /// Fetch the model file from blob storage. Failures are logged; the load
    /// that follows reports the missing file.
    async fn fetch_model(&self, dest: &Path) {
        let Some(bucket) = self.config.bucket.as_deref() else {
            warn!(
                path = %dest.display(),
                "Model file missing and no bucket configured, skipping download"
            );
            return;
        };

        let Some(fetcher) = self.fetcher.as_ref() else {
            warn!(bucket, "Model bucket configured but no blob client available");
            return;
        };

        let key = self.config.blob_key.as_str();
        info!(bucket, key, path = %dest.display(), "Downloading model");

        match fetcher.fetch(bucket, key, dest).await {
            Ok(bytes) => {
                metrics::counter!(metric_names::MODEL_FETCHES, "status" => "success").increment(1);
                info!(bucket, key, bytes, "Model downloaded");
            }
            Err(e) => {
                metrics::counter!(metric_names::MODEL_FETCHES, "status" => "error").increment(1);
                error!(bucket, key, error = %e, "Model download failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::predictor::HeadTensor;
    use async_trait::async_trait;
    use engage_storage::{StorageError, StorageResult};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FakePredictor;

    impl Predictor for FakePredictor {
        fn predict(&self, batch: Batch) -> InferenceResult<RawHeadOutputs> {
            let frames = batch.shape()[1] as f32;
            Ok(RawHeadOutputs::new(vec![HeadTensor::batched(vec![frames])]))
        }
    }

    #[derive(Default)]
    struct FakeLoader {
        calls: AtomicUsize,
        fail_first: usize,
        paths: Mutex<Vec<std::path::PathBuf>>,
    }

    impl ModelLoader for FakeLoader {
        fn load(&self, path: &Path) -> InferenceResult<Arc<dyn Predictor>> {
            let n = self.calls.fetch_add(1, Ordering::SeqCst);
            self.paths.lock().unwrap().push(path.to_path_buf());
            if n < self.fail_first {
                return Err(InferenceError::model_load(path, "corrupt"));
            }
            Ok(Arc::new(FakePredictor))
        }
    }

    #[derive(Default)]
    struct FakeFetcher {
        calls: AtomicUsize,
        fail: bool,
        requests: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl BlobFetcher for FakeFetcher {
        async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> StorageResult<u64> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.requests
                .lock()
                .unwrap()
                .push((bucket.to_string(), key.to_string()));
            if self.fail {
                return Err(StorageError::not_found(key));
            }
            tokio::fs::write(dest, b"model").await?;
            Ok(5)
        }
    }

    fn batch(frames: usize) -> Batch {
        use engage_media::{Frame, SequenceAssembler};
        let frame = Frame::from_array(ndarray::Array3::zeros((2, 2, 3))).unwrap();
        SequenceAssembler::new(frames).from_still(frame).into_batch().unwrap()
    }

    #[tokio::test]
    async fn test_model_created_once() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelSourceConfig::default()
            .with_local_path(dir.path().join("model.onnx"))
            .with_bucket("models");
        let fetcher = Arc::new(FakeFetcher::default());
        let loader = Arc::new(FakeLoader::default());
        let gateway = ModelGateway::new(config, Some(fetcher.clone()), loader.clone());

        assert!(!gateway.is_loaded());
        gateway.get_model().await.unwrap();
        gateway.get_model().await.unwrap();
        gateway.infer(batch(3)).await.unwrap();

        assert!(gateway.is_loaded());
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
        assert_eq!(
            fetcher.requests.lock().unwrap().as_slice(),
            &[("models".to_string(), "model.onnx".to_string())]
        );
    }

    #[tokio::test]
    async fn test_existing_file_skips_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"model").unwrap();

        let fetcher = Arc::new(FakeFetcher::default());
        let loader = Arc::new(FakeLoader::default());
        let config = ModelSourceConfig::default().with_local_path(&path).with_bucket("models");
        let gateway = ModelGateway::new(config, Some(fetcher.clone()), loader.clone());

        gateway.get_model().await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(loader.paths.lock().unwrap().as_slice(), &[path]);
    }

    #[tokio::test]
    async fn test_no_bucket_skips_fetch() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher::default());
        let loader = Arc::new(FakeLoader::default());
        let config = ModelSourceConfig::default().with_local_path(dir.path().join("model.onnx"));
        let gateway = ModelGateway::new(config, Some(fetcher.clone()), loader.clone());

        gateway.get_model().await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_not_raised() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = Arc::new(FakeFetcher {
            fail: true,
            ..Default::default()
        });
        let loader = Arc::new(FakeLoader::default());
        let config = ModelSourceConfig::default()
            .with_local_path(dir.path().join("model.onnx"))
            .with_bucket("models");
        let gateway = ModelGateway::new(config, Some(fetcher.clone()), loader.clone());

        // The loader decides whether the missing file is fatal.
        gateway.get_model().await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_load_is_retried() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        std::fs::write(&path, b"model").unwrap();

        let loader = Arc::new(FakeLoader {
            fail_first: 1,
            ..Default::default()
        });
        let config = ModelSourceConfig::default().with_local_path(&path);
        let gateway = ModelGateway::new(config, None, loader.clone());

        let err = gateway.get_model().await.err().unwrap();
        assert!(matches!(err, InferenceError::ModelLoad { .. }));
        assert!(!gateway.is_loaded());

        gateway.get_model().await.unwrap();
        assert!(gateway.is_loaded());
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_downloaded_file_reused_on_retry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.onnx");
        let fetcher = Arc::new(FakeFetcher::default());
        let loader = Arc::new(FakeLoader {
            fail_first: 1,
            ..Default::default()
        });
        let config = ModelSourceConfig::default().with_local_path(&path).with_bucket("models");
        let gateway = ModelGateway::new(config, Some(fetcher.clone()), loader.clone());

        assert!(gateway.get_model().await.is_err());
        assert!(path.exists());

        gateway.get_model().await.unwrap();
        assert_eq!(fetcher.calls.load(Ordering::SeqCst), 1);
        assert_eq!(loader.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_infer_runs_predictor() {
        let dir = tempfile::tempdir().unwrap();
        let config = ModelSourceConfig::default().with_local_path(dir.path().join("model.onnx"));
        let gateway = ModelGateway::new(config, None, Arc::new(FakeLoader::default()));

        let outputs = gateway.infer(batch(7)).await.unwrap();
        assert_eq!(outputs.get(0).unwrap().data, vec![7.0]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_first_calls_load_once() {
        let dir = tempfile::tempdir().unwrap();
        let loader = Arc::new(FakeLoader::default());
        let config = ModelSourceConfig::default().with_local_path(dir.path().join("model.onnx"));
        let gateway = Arc::new(ModelGateway::new(config, None, loader.clone()));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let gateway = Arc::clone(&gateway);
                tokio::spawn(async move { gateway.get_model().await.map(|_| ()) })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        assert_eq!(loader.calls.load(Ordering::SeqCst), 1);
    }
}
