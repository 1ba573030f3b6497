//! Still image decoding.

use crate::error::{MediaError, MediaResult};
use crate::frame::{ChannelOrder, RawFrame};

/// Decode an encoded still image (PNG, JPEG, BMP, ...) into an RGB frame.
///
/// The format is sniffed from the bytes, not from any file name.
pub fn decode_image(bytes: &[u8]) -> MediaResult<RawFrame> {
    if bytes.is_empty() {
        return Err(MediaError::invalid_image("empty upload"));
    }

    let decoded = image::load_from_memory(bytes).map_err(|e| MediaError::invalid_image(e.to_string()))?;
    let rgb = decoded.to_rgb8();
    let (width, height) = rgb.dimensions();

    RawFrame::new(width, height, ChannelOrder::Rgb, rgb.into_raw())
}
