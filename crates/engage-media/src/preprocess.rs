//! Upload-to-sequence pipelines.
//!
//! [`Preprocessor`] ties the decoder, sampler, normalizer and assembler
//! together for the two request kinds: a single still image and a video.
//! Both pipelines are synchronous and meant to run on a blocking thread.

use std::fmt;
use std::sync::Arc;

use engage_models::{FRAME_HEIGHT, FRAME_WIDTH, NUM_FRAMES};
use tracing::{debug, info};

use crate::decode::{decode_image, BackendOpener, FrameSource, VideoOpener};
use crate::error::MediaResult;
use crate::normalize::FrameNormalizer;
use crate::sampler::sample_frames;
use crate::scratch::ScratchFile;
use crate::sequence::{FrameSequence, SequenceAssembler};

/// Shape of one model input sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputSpec {
    pub num_frames: usize,
    pub height: u32,
    pub width: u32,
}

impl Default for InputSpec {
    fn default() -> Self {
        Self {
            num_frames: NUM_FRAMES,
            height: FRAME_HEIGHT,
            width: FRAME_WIDTH,
        }
    }
}

/// Turns uploaded bytes into frame sequences.
#[derive(Clone)]
pub struct Preprocessor {
    spec: InputSpec,
    normalizer: FrameNormalizer,
    assembler: SequenceAssembler,
    opener: Arc<dyn VideoOpener>,
}

impl Default for Preprocessor {
    fn default() -> Self {
        Self::new(InputSpec::default())
    }
}

impl fmt::Debug for Preprocessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Preprocessor")
            .field("spec", &self.spec)
            .field("normalizer", &self.normalizer)
            .finish_non_exhaustive()
    }
}

/// File suffix for spilled video uploads; the container is sniffed, not trusted.
const SCRATCH_SUFFIX: &str = ".avi";

/// Result of the video pipeline.
#[derive(Debug, Clone)]
pub struct VideoSequence {
    pub sequence: FrameSequence,
    pub total_frames: usize,
    pub duplicated: usize,
}

impl Preprocessor {
    pub fn new(spec: InputSpec) -> Self {
        Self {
            spec,
            normalizer: FrameNormalizer::new(spec.width, spec.height),
            assembler: SequenceAssembler::new(spec.num_frames),
            opener: Arc::new(BackendOpener),
        }
    }

    /// Replace the video backend.
    pub fn with_video_opener(mut self, opener: Arc<dyn VideoOpener>) -> Self {
        self.opener = opener;
        self
    }

    pub fn spec(&self) -> InputSpec {
        self.spec
    }

    /// Decode a still image and replicate it into a full sequence.
    pub fn image_sequence(&self, bytes: &[u8]) -> MediaResult<FrameSequence> {
        let raw = decode_image(bytes)?;
        debug!(width = raw.width(), height = raw.height(), "Decoded still image");

        let frame = self.normalizer.normalize(&raw);
        Ok(self.assembler.from_still(frame))
    }

    /// Spill a video upload to disk and sample a full sequence from it.
    pub fn video_sequence(&self, bytes: &[u8]) -> MediaResult<VideoSequence> {
        let scratch = ScratchFile::with_contents(bytes, SCRATCH_SUFFIX)?;
        let mut source = self.opener.open(scratch.path())?;
        self.video_sequence_from(&mut *source)
    }

    /// Sample a full sequence from an open frame source.
    pub fn video_sequence_from(&self, source: &mut dyn FrameSource) -> MediaResult<VideoSequence> {
        let total_frames = source.total_frames();

        let sampled = sample_frames(source, &self.normalizer, self.spec.num_frames)?;
        let duplicated = sampled.duplicated;

        info!(
            total_frames,
            sampled = sampled.frames.len(),
            duplicated,
            "Sampled video upload"
        );

        Ok(VideoSequence {
            sequence: self.assembler.from_video(sampled)?,
            total_frames,
            duplicated,
        })
    }
}
