//! Sequence assembly and batching.

use engage_models::{ModelType, NUM_FRAMES};
use ndarray::{Array5, ArrayView3, Axis};

use crate::error::{MediaError, MediaResult};
use crate::frame::Frame;
use crate::sampler::SampledFrames;

/// Where a sequence came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceOrigin {
    /// Frames sampled from a video
    Video,
    /// One still image replicated across every slot
    Still,
}

impl SequenceOrigin {
    pub fn model_type(&self) -> ModelType {
        match self {
            SequenceOrigin::Video => ModelType::Original,
            SequenceOrigin::Still => ModelType::RealTime,
        }
    }
}

/// Fixed-length sequence of normalized frames.
#[derive(Debug, Clone)]
pub struct FrameSequence {
    frames: Vec<Frame>,
    origin: SequenceOrigin,
}

impl FrameSequence {
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn origin(&self) -> SequenceOrigin {
        self.origin
    }

    /// Stack the frames and add a leading batch dimension of 1.
    pub fn into_batch(self) -> MediaResult<Batch> {
        let views: Vec<ArrayView3<'_, f32>> = self.frames.iter().map(Frame::view).collect();
        let stacked = ndarray::stack(Axis(0), &views)
            .map_err(|e| MediaError::internal(format!("frame shapes differ: {e}")))?;
        Ok(Batch(stacked.insert_axis(Axis(0))))
    }
}

/// Model input tensor of shape `(1, frames, height, width, 3)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch(Array5<f32>);

impl Batch {
    pub fn shape(&self) -> &[usize] {
        self.0.shape()
    }

    pub fn as_array(&self) -> &Array5<f32> {
        &self.0
    }

    /// Shape and row-major data, the form tensor constructors take.
    pub fn into_raw_parts(self) -> (Vec<usize>, Vec<f32>) {
        let shape = self.0.shape().to_vec();
        let data = if self.0.is_standard_layout() {
            self.0.into_raw_vec()
        } else {
            self.0.iter().copied().collect()
        };
        (shape, data)
    }
}

/// Builds sequences of the length the model expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceAssembler {
    num_frames: usize,
}

impl Default for SequenceAssembler {
    fn default() -> Self {
        Self::new(NUM_FRAMES)
    }
}

impl SequenceAssembler {
    pub fn new(num_frames: usize) -> Self {
        Self { num_frames }
    }

    pub fn num_frames(&self) -> usize {
        self.num_frames
    }

    pub fn from_video(&self, sampled: SampledFrames) -> MediaResult<FrameSequence> {
        if sampled.frames.len() != self.num_frames {
            return Err(MediaError::internal(format!(
                "expected {} sampled frames, got {}",
                self.num_frames,
                sampled.frames.len()
            )));
        }

        Ok(FrameSequence {
            frames: sampled.frames,
            origin: SequenceOrigin::Video,
        })
    }

    /// Replicate one frame into every slot.
    pub fn from_still(&self, frame: Frame) -> FrameSequence {
        FrameSequence {
            frames: vec![frame; self.num_frames],
            origin: SequenceOrigin::Still,
        }
    }
}
