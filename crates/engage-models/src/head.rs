//! Prediction head definitions.
//!
//! The model emits five outputs per invocation. Four of them are categorical
//! heads (a probability distribution over ordinal levels); the fifth is the
//! scalar attention score, which is not a `PredictionHead`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Categorical prediction head.
///
/// Declaration order matches the model's output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PredictionHead {
    Boredom,
    Engagement,
    Confusion,
    Frustration,
}

impl PredictionHead {
    /// All categorical heads in model output order.
    pub const ALL: [PredictionHead; 4] = [
        PredictionHead::Boredom,
        PredictionHead::Engagement,
        PredictionHead::Confusion,
        PredictionHead::Frustration,
    ];

    /// Returns the head name as used in JSON responses.
    pub fn as_str(&self) -> &'static str {
        match self {
            PredictionHead::Boredom => "boredom",
            PredictionHead::Engagement => "engagement",
            PredictionHead::Confusion => "confusion",
            PredictionHead::Frustration => "frustration",
        }
    }

    /// Position of this head in the model output list.
    pub fn output_index(&self) -> usize {
        match self {
            PredictionHead::Boredom => 0,
            PredictionHead::Engagement => 1,
            PredictionHead::Confusion => 2,
            PredictionHead::Frustration => 3,
        }
    }
}

impl fmt::Display for PredictionHead {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_index_matches_declaration_order() {
        for (i, head) in PredictionHead::ALL.iter().enumerate() {
            assert_eq!(head.output_index(), i);
        }
    }

    #[test]
    fn test_display_matches_wire_name() {
        for head in PredictionHead::ALL {
            let json = serde_json::to_string(&head).unwrap();
            assert_eq!(json, format!("\"{head}\""));
        }
    }

    #[test]
    fn test_serde_uses_lowercase_names() {
        let json = serde_json::to_string(&PredictionHead::Frustration).unwrap();
        assert_eq!(json, "\"frustration\"");
    }
}
