//! S3-compatible client implementation.

use std::path::Path;

use aws_config::BehaviorVersion;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::{Builder, Region};
use aws_sdk_s3::Client;
use aws_types::SdkConfig;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

use crate::error::{StorageError, StorageResult};
use crate::fetch::{commit_partial, partial_path};

/// Configuration for the blob client.
///
/// Every field is optional: with nothing set, the default AWS endpoint,
/// region resolution and credential chain are used.
#[derive(Debug, Clone, Default)]
pub struct BlobConfig {
    /// S3 API endpoint URL (R2, GCS interoperability, MinIO)
    pub endpoint_url: Option<String>,
    /// Region ("auto" for R2 and GCS)
    pub region: String,
    /// Static access key ID
    pub access_key_id: Option<String>,
    /// Static secret access key
    pub secret_access_key: Option<String>,
}

impl BlobConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let non_empty = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());

        Self {
            endpoint_url: non_empty("MODEL_STORAGE_ENDPOINT_URL"),
            region: non_empty("MODEL_STORAGE_REGION").unwrap_or_else(|| "auto".to_string()),
            access_key_id: non_empty("MODEL_STORAGE_ACCESS_KEY_ID"),
            secret_access_key: non_empty("MODEL_STORAGE_SECRET_ACCESS_KEY"),
        }
    }

    fn static_credentials(&self) -> StorageResult<Option<Credentials>> {
        match (&self.access_key_id, &self.secret_access_key) {
            (Some(id), Some(secret)) => Ok(Some(Credentials::new(id, secret, None, None, "engage-static"))),
            (None, None) => Ok(None),
            _ => Err(StorageError::config_error(
                "MODEL_STORAGE_ACCESS_KEY_ID and MODEL_STORAGE_SECRET_ACCESS_KEY must be set together",
            )),
        }
    }
}

/// Blob storage client.
///
/// The bucket is chosen per call so one client serves any configured bucket.
#[derive(Clone)]
pub struct BlobClient {
    client: Client,
}

impl BlobClient {
    /// Create a new client from configuration.
    pub async fn new(config: BlobConfig) -> StorageResult<Self> {
        let credentials = config.static_credentials()?;

        let builder = match credentials {
            Some(credentials) => Builder::new()
                .behavior_version(BehaviorVersion::latest())
                .region(Region::new(config.region.clone()))
                .credentials_provider(credentials),
            None => {
                let shared: SdkConfig = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new(config.region.clone()))
                    .load()
                    .await;
                Builder::from(&shared)
            }
        };

        let builder = match &config.endpoint_url {
            Some(endpoint) => builder.endpoint_url(endpoint).force_path_style(true),
            None => builder,
        };

        debug!(
            endpoint = config.endpoint_url.as_deref().unwrap_or("default"),
            region = %config.region,
            "Configured blob client"
        );

        Ok(Self {
            client: Client::from_conf(builder.build()),
        })
    }

    /// Create from environment variables.
    pub async fn from_env() -> StorageResult<Self> {
        Self::new(BlobConfig::from_env()).await
    }

    /// Stream an object to a local file.
    ///
    /// The body is written to a sibling `.partial` file and renamed into
    /// place once complete, so `path` never holds a truncated object.
    pub async fn download_file(&self, bucket: &str, key: &str, path: impl AsRef<Path>) -> StorageResult<u64> {
        let path = path.as_ref();
        debug!("Downloading {}/{} to {}", bucket, key, path.display());

        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("NoSuchKey") {
                    StorageError::not_found(format!("{}/{}", bucket, key))
                } else {
                    StorageError::DownloadFailed(e.to_string())
                }
            })?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| StorageError::download_failed(format!("Failed to create directory: {}", e)))?;
        }

        let partial = partial_path(path);
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut body = response.body;
        let mut written: u64 = 0;

        let streamed: StorageResult<()> = async {
            while let Some(chunk) = body
                .try_next()
                .await
                .map_err(|e| StorageError::DownloadFailed(e.to_string()))?
            {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
            }
            file.flush().await?;
            Ok(())
        }
        .await;

        if let Err(e) = streamed {
            let _ = tokio::fs::remove_file(&partial).await;
            return Err(e);
        }
        drop(file);

        commit_partial(&partial, path).await?;

        info!("Downloaded {}/{} to {} ({} bytes)", bucket, key, path.display(), written);
        Ok(written)
    }

    /// Check connectivity by performing a head bucket operation.
    pub async fn check_connectivity(&self, bucket: &str) -> StorageResult<()> {
        self.client
            .head_bucket()
            .bucket(bucket)
            .send()
            .await
            .map_err(|e| StorageError::AwsSdk(format!("Blob store connectivity check failed: {}", e)))?;
        Ok(())
    }
}
