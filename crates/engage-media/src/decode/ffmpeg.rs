//! Frame access through the ffmpeg command line tools.
//!
//! `ffprobe` supplies the frame count and stream geometry once at open time;
//! each `read_frame` runs one `ffmpeg` process that selects a single frame by
//! index and writes it to stdout as raw `bgr24`.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::{debug, warn};

use super::FrameSource;
use crate::error::{MediaError, MediaResult};
use crate::frame::{ChannelOrder, RawFrame};

/// Stream properties needed for frame extraction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct StreamGeometry {
    pub total_frames: usize,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    nb_frames: Option<String>,
    nb_read_packets: Option<String>,
}

/// Parse `ffprobe -of json` stream output.
///
/// `nb_frames` comes from the container header and is missing or `N/A` for
/// some formats, in which case the counted packets are used.
pub(crate) fn parse_probe(json: &[u8]) -> MediaResult<StreamGeometry> {
    let probe: FfprobeOutput = serde_json::from_slice(json)?;

    let Some(stream) = probe
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref().map_or(true, |t| t == "video"))
    else {
        return Ok(StreamGeometry::default());
    };

    let parse_count = |v: &Option<String>| v.as_deref().and_then(|s| s.parse::<usize>().ok());
    let total_frames = parse_count(&stream.nb_frames)
        .filter(|n| *n > 0)
        .or_else(|| parse_count(&stream.nb_read_packets))
        .unwrap_or(0);

    Ok(StreamGeometry {
        total_frames,
        width: stream.width.unwrap_or(0),
        height: stream.height.unwrap_or(0),
    })
}

fn probe_stream(path: &Path) -> MediaResult<StreamGeometry> {
    let output = Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-select_streams",
            "v:0",
            "-count_packets",
            "-show_entries",
            "stream=codec_type,width,height,nb_frames,nb_read_packets",
            "-of",
            "json",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()?;

    if !output.status.success() {
        return Err(MediaError::FfprobeFailed {
            message: "FFprobe failed".to_string(),
            stderr: Some(String::from_utf8_lossy(&output.stderr).to_string()),
        });
    }

    parse_probe(&output.stdout)
}

/// Video opened through ffprobe/ffmpeg.
#[derive(Debug)]
pub struct FfmpegFrameSource {
    path: PathBuf,
    geometry: StreamGeometry,
}

impl FfmpegFrameSource {
    /// Open a video file.
    ///
    /// A container ffprobe cannot read, or one without a video stream, opens
    /// successfully but reports zero frames.
    pub fn open(path: impl AsRef<Path>) -> MediaResult<Self> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(MediaError::FileNotFound(path.to_path_buf()));
        }

        which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;
        which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)?;

        let geometry = match probe_stream(path) {
            Ok(g) if g.width > 0 && g.height > 0 => g,
            Ok(_) => {
                warn!(path = %path.display(), "No decodable video stream");
                StreamGeometry::default()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Video probe failed");
                StreamGeometry::default()
            }
        };

        debug!(
            path = %path.display(),
            total_frames = geometry.total_frames,
            width = geometry.width,
            height = geometry.height,
            "Opened video"
        );

        Ok(Self {
            path: path.to_path_buf(),
            geometry,
        })
    }

    pub fn width(&self) -> u32 {
        self.geometry.width
    }

    pub fn height(&self) -> u32 {
        self.geometry.height
    }
}

impl FrameSource for FfmpegFrameSource {
    fn total_frames(&self) -> usize {
        self.geometry.total_frames
    }

    fn read_frame(&mut self, index: usize) -> MediaResult<RawFrame> {
        if index >= self.geometry.total_frames {
            return Err(MediaError::DecodeFailure { index });
        }

        // Commas separate filters in a filtergraph, so the one inside eq() is escaped.
        let filter = format!("select=eq(n\\,{})", index);

        let output = Command::new("ffmpeg")
            .args(["-v", "error", "-noautorotate", "-i"])
            .arg(&self.path)
            .args([
                "-vf",
                filter.as_str(),
                "-vsync",
                "0",
                "-frames:v",
                "1",
                "-f",
                "rawvideo",
                "-pix_fmt",
                "bgr24",
                "pipe:1",
            ])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()?;

        if !output.status.success() {
            debug!(
                index,
                stderr = %String::from_utf8_lossy(&output.stderr),
                "Frame extraction failed"
            );
            return Err(MediaError::DecodeFailure { index });
        }

        RawFrame::new(
            self.geometry.width,
            self.geometry.height,
            ChannelOrder::Bgr,
            output.stdout,
        )
        .map_err(|_| MediaError::DecodeFailure { index })
    }
}
