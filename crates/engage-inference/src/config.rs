//! Model source configuration.

use std::path::PathBuf;

/// Where the model is loaded from when no override is given.
pub const DEFAULT_MODEL_PATH: &str = "saved_models/1/model.onnx";

/// Object key used when no blob name is configured.
pub const DEFAULT_MODEL_BLOB: &str = "model.onnx";

/// Where to find the model file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSourceConfig {
    /// Local model file; fetched here when missing
    pub local_path: PathBuf,
    /// Bucket holding the model; `None` means local-only
    pub bucket: Option<String>,
    /// Object key inside `bucket`
    pub blob_key: String,
}

impl Default for ModelSourceConfig {
    fn default() -> Self {
        Self {
            local_path: PathBuf::from(DEFAULT_MODEL_PATH),
            bucket: None,
            blob_key: DEFAULT_MODEL_BLOB.to_string(),
        }
    }
}

impl ModelSourceConfig {
    /// Load from environment variables.
    ///
    /// `GCS_BUCKET_NAME` and `GCS_MODEL_BLOB` are accepted as fallbacks for
    /// deployments configured before the storage backend was generalized.
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            local_path: var("MODEL_LOCAL_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH)),
            bucket: var("MODEL_BUCKET_NAME").or_else(|| var("GCS_BUCKET_NAME")),
            blob_key: var("MODEL_BLOB")
                .or_else(|| var("GCS_MODEL_BLOB"))
                .unwrap_or_else(|| DEFAULT_MODEL_BLOB.to_string()),
        }
    }

    pub fn with_local_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.local_path = path.into();
        self
    }

    pub fn with_bucket(mut self, bucket: impl Into<String>) -> Self {
        self.bucket = Some(bucket.into());
        self
    }

    pub fn with_blob_key(mut self, key: impl Into<String>) -> Self {
        self.blob_key = key.into();
        self
    }
}
