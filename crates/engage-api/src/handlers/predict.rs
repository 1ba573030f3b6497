//! Prediction handlers.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartRejection};
use axum::extract::State;
use axum::Json;
use engage_inference::{decode_prediction, ResultMeta};
use engage_media::Batch;
use engage_models::{ErrorEnvelope, PredictionResult};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{is_video_file_name, Endpoint, PredictError};
use crate::metrics;
use crate::state::AppState;

/// Multipart form field holding the upload.
const UPLOAD_FIELD: &str = "file";

/// Body of a prediction response: a result or an error envelope, both
/// served with status 200.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PredictReply {
    Ok(PredictionResult),
    Err(ErrorEnvelope),
}

/// An uploaded file.
#[derive(Debug)]
struct Upload {
    file_name: Option<String>,
    bytes: Bytes,
}

async fn read_upload(multipart: Result<Multipart, MultipartRejection>) -> Result<Upload, PredictError> {
    let mut multipart = multipart?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }
        let file_name = field.file_name().map(str::to_owned);
        let bytes = field.bytes().await?;
        debug!(file_name = ?file_name, size = bytes.len(), "Received upload");
        return Ok(Upload { file_name, bytes });
    }

    Err(PredictError::MissingUpload)
}

fn reply(state: &AppState, endpoint: Endpoint, result: Result<PredictionResult, PredictError>) -> Json<PredictReply> {
    match result {
        Ok(prediction) => {
            metrics::record_prediction(endpoint.as_str(), "success");
            info!(
                endpoint = endpoint.as_str(),
                engagement = prediction.engagement.level,
                attention = prediction.attention_score,
                "Prediction completed"
            );
            Json(PredictReply::Ok(prediction))
        }
        Err(e) => {
            metrics::record_prediction(endpoint.as_str(), e.kind());
            warn!(endpoint = endpoint.as_str(), error = %e, "Prediction failed");
            Json(PredictReply::Err(
                e.envelope(endpoint, state.config.expose_error_details),
            ))
        }
    }
}

/// Score a single still image.
pub async fn predict_frame(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<PredictReply> {
    let result = run_frame(&state, multipart).await;
    reply(&state, Endpoint::Frame, result)
}

async fn run_frame(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<PredictionResult, PredictError> {
    let upload = read_upload(multipart).await?;

    let preprocessor = Arc::clone(&state.preprocessor);
    let batch: Batch = tokio::task::spawn_blocking(move || {
        preprocessor
            .image_sequence(&upload.bytes)
            .and_then(|sequence| sequence.into_batch())
    })
    .await
    .map_err(|e| PredictError::internal(format!("preprocessing task failed: {e}")))??;

    let outputs = state.gateway.infer(batch).await?;
    Ok(decode_prediction(&outputs, ResultMeta::still())?)
}

/// Score an uploaded MP4 or AVI video.
pub async fn predict(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Json<PredictReply> {
    let result = run_video(&state, multipart).await;
    reply(&state, Endpoint::Video, result)
}

async fn run_video(
    state: &AppState,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<PredictionResult, PredictError> {
    let upload = read_upload(multipart).await?;

    if !upload.file_name.as_deref().is_some_and(is_video_file_name) {
        return Err(PredictError::InvalidFileType);
    }

    let preprocessor = Arc::clone(&state.preprocessor);
    let video = tokio::task::spawn_blocking(move || preprocessor.video_sequence(&upload.bytes))
        .await
        .map_err(|e| PredictError::internal(format!("preprocessing task failed: {e}")))??;

    if video.duplicated > 0 {
        metrics::record_duplicated_frames(video.duplicated);
    }

    let frames_processed = video.sequence.len();
    let batch = video.sequence.into_batch()?;
    let outputs = state.gateway.infer(batch).await?;
    Ok(decode_prediction(&outputs, ResultMeta::video(frames_processed))?)
}
