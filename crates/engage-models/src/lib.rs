//! Shared data models for the engagement classification service.
//!
//! This crate provides Serde-serializable types for:
//! - Prediction heads and per-head results
//! - The structured prediction response
//! - Model variant tags and static model metadata
//! - The JSON error envelope returned by the prediction endpoints

pub mod envelope;
pub mod head;
pub mod input;
pub mod model_info;
pub mod prediction;

// Re-export common types
pub use envelope::ErrorEnvelope;
pub use head::PredictionHead;
pub use input::{FRAME_HEIGHT, FRAME_WIDTH, NUM_FRAMES, OUTPUT_HEAD_COUNT};
pub use model_info::{ModelInfo, ModelType};
pub use prediction::{HeadPrediction, PredictionResult};
