//! JSON error envelope.
//!
//! Prediction endpoints never fail at the protocol level: every request-level
//! failure is reported as a 200 response whose body is this envelope.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ErrorEnvelope {
    /// Short error title, or the error text for unexpected failures
    pub error: String,
    /// Human-readable explanation
    pub message: String,
    /// Error cause chain; only present when detail exposure is enabled
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub traceback: Option<String>,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            traceback: None,
        }
    }

    /// Attach a cause chain.
    pub fn with_traceback(mut self, traceback: impl Into<String>) -> Self {
        self.traceback = Some(traceback.into());
        self
    }
}
