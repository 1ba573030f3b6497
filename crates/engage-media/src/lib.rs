#![deny(unreachable_patterns)]
//! Model input preparation.
//!
//! This crate provides:
//! - Frame decoding for still images and seekable video containers
//! - Fixed-length temporal sampling with duplicate-on-failure padding
//! - Frame normalization (RGB, model resolution, [0,1] floats)
//! - Sequence assembly and batching for the sequence model
//! - A scoped scratch file for video uploads

pub mod decode;
pub mod error;
pub mod frame;
pub mod normalize;
pub mod preprocess;
pub mod sampler;
pub mod scratch;
pub mod sequence;

pub use decode::{decode_image, open_video, BackendOpener, FfmpegFrameSource, FrameSource, VideoOpener};
#[cfg(feature = "opencv")]
pub use decode::OpenCvFrameSource;
pub use error::{MediaError, MediaResult};
pub use frame::{ChannelOrder, Frame, RawFrame};
pub use normalize::FrameNormalizer;
pub use preprocess::{InputSpec, Preprocessor, VideoSequence};
pub use sampler::{sample_frames, sample_indices, SampledFrames};
pub use scratch::ScratchFile;
pub use sequence::{Batch, FrameSequence, SequenceAssembler, SequenceOrigin};
