//! Application state.

use std::sync::Arc;

use engage_inference::{ModelGateway, ModelSourceConfig, OrtModelLoader};
use engage_media::Preprocessor;
use engage_storage::{BlobClient, BlobFetcher};
use tracing::info;

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub gateway: Arc<ModelGateway>,
    pub preprocessor: Arc<Preprocessor>,
    /// Present when a model bucket is configured
    pub storage: Option<Arc<BlobClient>>,
}

impl AppState {
    /// Create new application state.
    ///
    /// The model is not loaded here; the first prediction loads it.
    pub async fn new(config: ApiConfig) -> Result<Self, Box<dyn std::error::Error>> {
        let source = ModelSourceConfig::from_env();

        let storage = match source.bucket.as_deref() {
            Some(bucket) => {
                info!(bucket, key = %source.blob_key, "Model bucket configured");
                Some(Arc::new(BlobClient::from_env().await?))
            }
            None => {
                info!(path = %source.local_path.display(), "No model bucket configured, using local model only");
                None
            }
        };

        let fetcher = storage
            .as_ref()
            .map(|client| Arc::clone(client) as Arc<dyn BlobFetcher>);
        let gateway = ModelGateway::new(source, fetcher, Arc::new(OrtModelLoader));

        Ok(Self {
            config,
            gateway: Arc::new(gateway),
            preprocessor: Arc::new(Preprocessor::default()),
            storage,
        })
    }

    /// Build state around an existing gateway.
    pub fn with_gateway(config: ApiConfig, gateway: Arc<ModelGateway>) -> Self {
        Self {
            config,
            gateway,
            preprocessor: Arc::new(Preprocessor::default()),
            storage: None,
        }
    }

    /// Replace the upload preprocessor.
    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = Arc::new(preprocessor);
        self
    }
}
