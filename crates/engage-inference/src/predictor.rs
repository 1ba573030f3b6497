//! Model seams.
//!
//! The trained network is an opaque function from a [`Batch`] to five
//! output tensors. [`Predictor`] is that function; [`ModelLoader`] turns a
//! model file into one. Both are synchronous and run on the blocking pool.

use std::path::Path;
use std::sync::Arc;

use engage_media::Batch;

use crate::error::InferenceResult;

/// One output tensor of the model, flattened.
#[derive(Debug, Clone, PartialEq)]
pub struct HeadTensor {
    pub shape: Vec<i64>,
    pub data: Vec<f32>,
}

impl HeadTensor {
    pub fn new(shape: Vec<i64>, data: Vec<f32>) -> Self {
        Self { shape, data }
    }

    /// A `[1, k]` tensor, the shape a batch of one produces.
    pub fn batched(data: Vec<f32>) -> Self {
        Self {
            shape: vec![1, data.len() as i64],
            data,
        }
    }
}

/// Output tensors of one model invocation, in model output order:
/// boredom, engagement, confusion, frustration, attention.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawHeadOutputs {
    heads: Vec<HeadTensor>,
}

impl RawHeadOutputs {
    pub fn new(heads: Vec<HeadTensor>) -> Self {
        Self { heads }
    }

    pub fn len(&self) -> usize {
        self.heads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heads.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&HeadTensor> {
        self.heads.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeadTensor> {
        self.heads.iter()
    }
}

/// A loaded model.
pub trait Predictor: Send + Sync {
    fn predict(&self, batch: Batch) -> InferenceResult<RawHeadOutputs>;
}

/// Builds a [`Predictor`] from a model file.
pub trait ModelLoader: Send + Sync {
    fn load(&self, path: &Path) -> InferenceResult<Arc<dyn Predictor>>;
}
