//! Frame access through OpenCV's `VideoCapture`.

use opencv::core::Mat;
use opencv::prelude::{MatTraitConst, MatTraitConstManual, VideoCaptureTrait, VideoCaptureTraitConst};
use opencv::videoio::{VideoCapture, CAP_ANY, CAP_PROP_FRAME_COUNT, CAP_PROP_POS_FRAMES};
use std::path::Path;
use tracing::{debug, warn};

use super::FrameSource;
use crate::error::{MediaError, MediaResult};
use crate::frame::{ChannelOrder, RawFrame};

/// Video opened through OpenCV.
pub struct OpenCvFrameSource {
    cap: VideoCapture,
    total_frames: usize,
}

impl OpenCvFrameSource {
    /// Open a video file.
    ///
    /// A file OpenCV cannot open reports zero frames instead of failing.
    pub fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        let path_str = path
            .to_str()
            .ok_or_else(|| MediaError::backend(format!("Non UTF-8 path: {}", path.display())))?;

        let cap = VideoCapture::from_file(path_str, CAP_ANY)
            .map_err(|e| MediaError::backend(format!("Open video: {e}")))?;

        let total_frames = if cap.is_opened().unwrap_or(false) {
            cap.get(CAP_PROP_FRAME_COUNT)
                .map(|n| if n.is_finite() && n > 0.0 { n as usize } else { 0 })
                .unwrap_or(0)
        } else {
            warn!(path = %path.display(), "OpenCV could not open video");
            0
        };

        debug!(path = %path.display(), total_frames, "Opened video");

        Ok(Self { cap, total_frames })
    }
}

impl FrameSource for OpenCvFrameSource {
    fn total_frames(&self) -> usize {
        self.total_frames
    }

    fn read_frame(&mut self, index: usize) -> MediaResult<RawFrame> {
        self.cap
            .set(CAP_PROP_POS_FRAMES, index as f64)
            .map_err(|e| MediaError::backend(format!("Seek: {e}")))?;

        let mut frame = Mat::default();
        let ok = self
            .cap
            .read(&mut frame)
            .map_err(|e| MediaError::backend(format!("Read: {e}")))?;
        if !ok || frame.empty() || frame.channels() != 3 {
            return Err(MediaError::DecodeFailure { index });
        }

        let width = frame.cols() as u32;
        let height = frame.rows() as u32;
        let data = frame
            .data_bytes()
            .map_err(|_| MediaError::DecodeFailure { index })?
            .to_vec();

        RawFrame::new(width, height, ChannelOrder::Bgr, data).map_err(|_| MediaError::DecodeFailure { index })
    }
}
