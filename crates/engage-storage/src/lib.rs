//! S3-compatible blob storage client.
//!
//! This crate provides:
//! - Object download to memory or to a local file
//! - Connectivity checks for readiness probes
//! - The [`BlobFetcher`] seam used to fetch model artifacts

pub mod client;
pub mod error;
pub mod fetch;

pub use client::{BlobClient, BlobConfig};
pub use error::{StorageError, StorageResult};
pub use fetch::{partial_path, BlobFetcher};
