//! Model access and output decoding.
//!
//! This crate provides:
//! - [`ModelGateway`], the process-wide context that lazily fetches and loads
//!   the model exactly once
//! - The [`Predictor`] / [`ModelLoader`] seams and their ONNX Runtime
//!   implementations
//! - Decoding of the five raw model heads into a [`PredictionResult`]
//! - Repair of legacy Keras model configs (`fix-model-config` binary)
//!
//! [`PredictionResult`]: engage_models::PredictionResult

pub mod config;
pub mod decoder;
pub mod error;
pub mod gateway;
pub mod model_compat;
pub mod ort_predictor;
pub mod predictor;

pub use config::{ModelSourceConfig, DEFAULT_MODEL_BLOB, DEFAULT_MODEL_PATH};
pub use decoder::{decode_prediction, ResultMeta};
pub use error::{InferenceError, InferenceResult};
pub use gateway::ModelGateway;
pub use model_compat::{fix_keras_config, CompatReport};
pub use ort_predictor::{OrtModelLoader, OrtPredictor};
pub use predictor::{HeadTensor, ModelLoader, Predictor, RawHeadOutputs};
