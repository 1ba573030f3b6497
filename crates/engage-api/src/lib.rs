//! Axum HTTP API server.
//!
//! This crate provides:
//! - `/predict_frame` and `/predict` multipart prediction endpoints
//! - Liveness, readiness and `/ping` probes
//! - Security headers, request ids and request logging
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{Endpoint, PredictError};
pub use routes::create_router;
pub use state::AppState;
