//! Frame decoding.
//!
//! Still images are decoded in memory with the `image` crate. Videos are read
//! through a [`FrameSource`], which exposes the frame count and random access
//! by frame index. Two backends exist: the ffmpeg CLI (default) and OpenCV's
//! `VideoCapture` (cargo feature `opencv`).

mod ffmpeg;
mod still;
#[cfg(feature = "opencv")]
mod capture;

use std::path::Path;

use crate::error::MediaResult;
use crate::frame::RawFrame;

pub use self::ffmpeg::FfmpegFrameSource;
pub use self::still::decode_image;
#[cfg(feature = "opencv")]
pub use self::capture::OpenCvFrameSource;

/// Random-access source of decoded video frames.
pub trait FrameSource: Send {
    /// Number of frames the container reports. Zero when unreadable.
    fn total_frames(&self) -> usize;

    /// Seek to `index` and decode that frame.
    fn read_frame(&mut self, index: usize) -> MediaResult<RawFrame>;
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn total_frames(&self) -> usize {
        (**self).total_frames()
    }

    fn read_frame(&mut self, index: usize) -> MediaResult<RawFrame> {
        (**self).read_frame(index)
    }
}

/// Open a video file with the compiled-in backend.
#[cfg(feature = "opencv")]
pub fn open_video(path: impl AsRef<Path>) -> MediaResult<Box<dyn FrameSource>> {
    Ok(Box::new(OpenCvFrameSource::open(path)?))
}

/// Open a video file with the compiled-in backend.
#[cfg(not(feature = "opencv"))]
pub fn open_video(path: impl AsRef<Path>) -> MediaResult<Box<dyn FrameSource>> {
    Ok(Box::new(FfmpegFrameSource::open(path)?))
}

/// Opens uploaded video files as frame sources.
pub trait VideoOpener: Send + Sync {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>>;
}

/// Opens videos with the compiled-in backend, see [`open_video`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendOpener;

impl VideoOpener for BackendOpener {
    fn open(&self, path: &Path) -> MediaResult<Box<dyn FrameSource>> {
        open_video(path)
    }
}
