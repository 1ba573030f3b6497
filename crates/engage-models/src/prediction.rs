//! Structured prediction results.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::head::PredictionHead;
use crate::model_info::{ModelInfo, ModelType};

/// Decoded output of one categorical head.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HeadPrediction {
    /// Arg-max index of `probabilities` (0 = lowest level)
    pub level: usize,
    /// Probability of the selected level
    pub confidence: f32,
    /// Full distribution as produced by the model
    pub probabilities: Vec<f32>,
}

/// Prediction response for one image or video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PredictionResult {
    pub boredom: HeadPrediction,
    pub engagement: HeadPrediction,
    pub confusion: HeadPrediction,
    pub frustration: HeadPrediction,

    /// Scalar attention score in [0, 1]
    pub attention_score: f32,

    /// Number of frames fed to the model (video path only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frames_processed: Option<usize>,

    pub model_type: ModelType,

    /// Static model metadata (video path only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_info: Option<ModelInfo>,
}

impl PredictionResult {
    /// Access a categorical head by name.
    pub fn head(&self, head: PredictionHead) -> &HeadPrediction {
        match head {
            PredictionHead::Boredom => &self.boredom,
            PredictionHead::Engagement => &self.engagement,
            PredictionHead::Confusion => &self.confusion,
            PredictionHead::Frustration => &self.frustration,
        }
    }

    /// Iterate over the categorical heads in model output order.
    pub fn heads(&self) -> impl Iterator<Item = (PredictionHead, &HeadPrediction)> {
        PredictionHead::ALL.into_iter().map(move |h| (h, self.head(h)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn head(level: usize, probabilities: Vec<f32>) -> HeadPrediction {
        HeadPrediction {
            level,
            confidence: probabilities[level],
            probabilities,
        }
    }

    fn sample_result(model_type: ModelType) -> PredictionResult {
        PredictionResult {
            boredom: head(0, vec![0.7, 0.2, 0.05, 0.05]),
            engagement: head(2, vec![0.1, 0.2, 0.6, 0.1]),
            confusion: head(1, vec![0.3, 0.5, 0.1, 0.1]),
            frustration: head(3, vec![0.1, 0.1, 0.1, 0.7]),
            attention_score: 0.83,
            frames_processed: None,
            model_type,
            model_info: None,
        }
    }

    #[test]
    fn test_frame_result_omits_video_metadata() {
        let json = serde_json::to_value(sample_result(ModelType::RealTime)).unwrap();
        let obj = json.as_object().unwrap();

        assert_eq!(obj["model_type"], "real-time");
        assert!(!obj.contains_key("frames_processed"));
        assert!(!obj.contains_key("model_info"));
        assert_eq!(obj["engagement"]["level"], 2);
        assert_eq!(obj["engagement"]["probabilities"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_video_result_includes_metadata() {
        let mut result = sample_result(ModelType::Original);
        result.frames_processed = Some(10);
        result.model_info = Some(ModelInfo::attention_lstm());

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["frames_processed"], 10);
        assert_eq!(json["model_type"], "original");
        assert_eq!(json["model_info"]["total_params"], 51_608_529);
    }

    #[test]
    fn test_heads_iterates_in_output_order() {
        let result = sample_result(ModelType::RealTime);
        let names: Vec<_> = result.heads().map(|(h, _)| h.as_str()).collect();
        assert_eq!(names, vec!["boredom", "engagement", "confusion", "frustration"]);
        assert_eq!(result.head(PredictionHead::Frustration).level, 3);
    }
}
