//! Prediction error types.
//!
//! Prediction endpoints answer every failure with HTTP 200 and an
//! [`ErrorEnvelope`] body; [`PredictError::envelope`] performs that mapping.

use std::error::Error as StdError;

use axum::extract::multipart::{MultipartError, MultipartRejection};
use engage_inference::InferenceError;
use engage_media::MediaError;
use engage_models::ErrorEnvelope;
use thiserror::Error;

/// Which prediction endpoint a failure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Frame,
    Video,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Frame => "predict_frame",
            Endpoint::Video => "predict",
        }
    }

    /// Envelope message for failures without a dedicated title.
    pub fn failure_message(&self) -> &'static str {
        match self {
            Endpoint::Frame => "Failed to process frame",
            Endpoint::Video => "Failed to process video file",
        }
    }
}

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("Invalid file type")]
    InvalidFileType,

    #[error("No file uploaded in form field 'file'")]
    MissingUpload,

    #[error("Invalid multipart request: {0}")]
    Multipart(#[from] MultipartRejection),

    #[error("Failed to read upload: {0}")]
    Upload(#[from] MultipartError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl PredictError {
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Metrics label for the outcome.
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::InvalidFileType => "invalid_file_type",
            PredictError::MissingUpload | PredictError::Multipart(_) | PredictError::Upload(_) => "bad_upload",
            PredictError::Media(MediaError::InvalidImage(_)) => "invalid_image",
            PredictError::Media(e) if e.is_content_error() => "bad_media",
            PredictError::Media(_) => "media_error",
            PredictError::Inference(_) => "inference_error",
            PredictError::Internal(_) => "internal_error",
        }
    }

    /// Build the response envelope for this error.
    ///
    /// `traceback` carries the error and its `source()` chain, one per line,
    /// and is only attached when `expose_details` is set.
    pub fn envelope(&self, endpoint: Endpoint, expose_details: bool) -> ErrorEnvelope {
        match self {
            PredictError::InvalidFileType => {
                ErrorEnvelope::new("Invalid file type", "Please upload either an MP4 or AVI video file")
            }
            PredictError::Media(MediaError::InvalidImage(_)) if endpoint == Endpoint::Frame => {
                ErrorEnvelope::new("Invalid image", "Could not decode image")
            }
            _ => {
                let envelope = ErrorEnvelope::new(self.to_string(), endpoint.failure_message());
                if expose_details {
                    envelope.with_traceback(error_chain(self))
                } else {
                    envelope
                }
            }
        }
    }
}

fn error_chain(err: &dyn StdError) -> String {
    let mut lines = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        lines.push(format!("Caused by: {}", cause));
        source = cause.source();
    }
    lines.join("\n")
}

/// Whether an upload name is an accepted video container.
pub fn is_video_file_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower.ends_with(".mp4") || lower.ends_with(".avi")
}
