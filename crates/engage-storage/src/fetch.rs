//! Object fetch seam.
//!
//! Consumers that only need "put this object at that path" depend on
//! [`BlobFetcher`] rather than on [`BlobClient`], so they can be exercised
//! without a network.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::client::BlobClient;
use crate::error::StorageResult;

/// Downloads one object to a local path.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    /// Fetch `bucket/key` into `dest`, returning the number of bytes written.
    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> StorageResult<u64>;
}

#[async_trait]
impl BlobFetcher for BlobClient {
    async fn fetch(&self, bucket: &str, key: &str, dest: &Path) -> StorageResult<u64> {
        self.download_file(bucket, key, dest).await
    }
}

/// Sibling path an in-progress download is written to.
pub fn partial_path(path: &Path) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".partial");
    path.with_file_name(name)
}

/// Move a finished `.partial` download into place. The partial file is
/// removed when the rename fails.
pub(crate) async fn commit_partial(partial: &Path, dest: &Path) -> StorageResult<()> {
    if let Err(e) = tokio::fs::rename(partial, dest).await {
        let _ = tokio::fs::remove_file(partial).await;
        return Err(e.into());
    }
    Ok(())
}
