//! Scoped scratch file for uploaded videos.
//!
//! Video backends need a seekable file on disk, so uploads are spilled to a
//! named temporary file. The file is deleted when the [`ScratchFile`] is
//! dropped, which covers every exit path of the request that created it.
//!
//! # Example
//!
//! ```ignore
//! use engage_media::ScratchFile;
//!
//! let scratch = ScratchFile::with_contents(&upload, ".avi")?;
//! let source = engage_media::open_video(scratch.path())?;
//! ```

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::MediaResult;

/// Temporary file removed on drop.
#[derive(Debug)]
pub struct ScratchFile {
    file: NamedTempFile,
}

impl ScratchFile {
    /// Create an empty scratch file whose name ends in `suffix`.
    pub fn new(suffix: &str) -> MediaResult<Self> {
        let file = tempfile::Builder::new()
            .prefix("engage-")
            .suffix(suffix)
            .tempfile()?;
        Ok(Self { file })
    }

    /// Create a scratch file holding `bytes`.
    pub fn with_contents(bytes: &[u8], suffix: &str) -> MediaResult<Self> {
        let mut scratch = Self::new(suffix)?;
        scratch.file.write_all(bytes)?;
        scratch.file.flush()?;
        debug!(path = %scratch.path().display(), size = bytes.len(), "Wrote scratch file");
        Ok(scratch)
    }

    pub fn path(&self) -> &Path {
        self.file.path()
    }
}
