//! Model variant tags and static model metadata.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Which input path produced a prediction.
///
/// The real-time path scores a single still image by replicating it across
/// the whole sequence, so its precision characteristics differ from the
/// original video path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum ModelType {
    /// Single frame replicated into a sequence.
    #[serde(rename = "real-time")]
    RealTime,
    /// Frames sampled from an uploaded video.
    #[serde(rename = "original")]
    Original,
}

impl ModelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelType::RealTime => "real-time",
            ModelType::Original => "original",
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Static description of the deployed model.
///
/// These are constants reported alongside video predictions, not values
/// measured at runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ModelInfo {
    /// Trainable + non-trainable parameter count
    pub total_params: u64,
    /// Serialized model size in megabytes
    pub model_size_mb: f64,
    /// Short architecture description
    pub architecture: String,
}

impl ModelInfo {
    /// Metadata of the CNN + LSTM attention model.
    pub fn attention_lstm() -> Self {
        Self {
            total_params: 51_608_529,
            model_size_mb: 196.87,
            architecture: "CNN + LSTM + Dense layers".to_string(),
        }
    }
}
