//! Health check handlers.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use serde::Serialize;

use crate::state::AppState;

/// Liveness message of the `/ping` endpoint.
pub const PING_MESSAGE: &str = "Hello, I am alive";

/// Ping endpoint.
pub async fn ping() -> Json<&'static str> {
    Json(PING_MESSAGE)
}

/// Health response.
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: String,
}

/// Health check endpoint (liveness probe).
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: Utc::now().to_rfc3339(),
    })
}

/// Readiness check response.
#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: String,
    pub checks: ReadinessChecks,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub model: CheckStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage: Option<CheckStatus>,
}

#[derive(Serialize)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
}

impl CheckStatus {
    fn ok(detail: impl Into<String>) -> Self {
        Self {
            status: "ok".to_string(),
            detail: Some(detail.into()),
            error: None,
            latency_ms: None,
        }
    }

    fn ok_timed(latency_ms: u64) -> Self {
        Self {
            status: "ok".to_string(),
            detail: None,
            error: None,
            latency_ms: Some(latency_ms),
        }
    }

    fn error(msg: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            detail: None,
            error: Some(msg.into()),
            latency_ms: None,
        }
    }

    fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Readiness check endpoint (readiness probe).
///
/// Ready when the model is loaded, or when it can be loaded: the model file
/// is on disk, or the model bucket is reachable.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let source = state.gateway.config();

    let storage_check = match (&state.storage, source.bucket.as_deref()) {
        (Some(client), Some(bucket)) => {
            let start = Instant::now();
            Some(match client.check_connectivity(bucket).await {
                Ok(()) => CheckStatus::ok_timed(start.elapsed().as_millis() as u64),
                Err(e) => CheckStatus::error(e.to_string()),
            })
        }
        _ => None,
    };

    let model_check = if state.gateway.is_loaded() {
        CheckStatus::ok("loaded")
    } else if source.local_path.exists() {
        CheckStatus::ok("on disk, not loaded")
    } else if storage_check.as_ref().is_some_and(CheckStatus::is_ok) {
        CheckStatus::ok("fetchable from bucket")
    } else {
        CheckStatus::error(format!(
            "model file {} missing and no reachable bucket",
            source.local_path.display()
        ))
    };

    let all_ok = model_check.is_ok() && storage_check.as_ref().map_or(true, CheckStatus::is_ok);

    let response = ReadinessResponse {
        status: if all_ok { "ready" } else { "degraded" }.to_string(),
        checks: ReadinessChecks {
            model: model_check,
            storage: storage_check,
        },
    };

    if all_ok {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}
