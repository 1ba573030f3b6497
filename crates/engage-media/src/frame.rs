//! Frame types.
//!
//! A [`RawFrame`] is what a decoder produces: interleaved 8-bit pixels at the
//! source resolution in the decoder's native channel order. A [`Frame`] is
//! what the model consumes: RGB `f32` values in `[0, 1]` at model resolution,
//! laid out as `(height, width, 3)`.

use ndarray::{Array3, ArrayView3};

use crate::error::{MediaError, MediaResult};

/// Channel order of an interleaved 8-bit frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelOrder {
    /// Blue-green-red, as produced by video decoders
    Bgr,
    /// Red-green-blue, as produced by image decoders
    Rgb,
}

/// Decoded 8-bit frame at source resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrame {
    width: u32,
    height: u32,
    order: ChannelOrder,
    data: Vec<u8>,
}

impl RawFrame {
    /// Wrap an interleaved 3-channel buffer.
    ///
    /// The buffer length must equal `width * height * 3`.
    pub fn new(width: u32, height: u32, order: ChannelOrder, data: Vec<u8>) -> MediaResult<Self> {
        if width == 0 || height == 0 {
            return Err(MediaError::InvalidFrame(format!(
                "frame has zero extent ({}x{})",
                width, height
            )));
        }

        let expected = width as usize * height as usize * 3;
        if data.len() != expected {
            return Err(MediaError::InvalidFrame(format!(
                "expected {} bytes for {}x{} frame, got {}",
                expected,
                width,
                height,
                data.len()
            )));
        }

        Ok(Self {
            width,
            height,
            order,
            data,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn order(&self) -> ChannelOrder {
        self.order
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGB value of the pixel at column `x`, row `y`.
    pub fn rgb_at(&self, x: u32, y: u32) -> [u8; 3] {
        let i = (y as usize * self.width as usize + x as usize) * 3;
        let px = &self.data[i..i + 3];
        match self.order {
            ChannelOrder::Rgb => [px[0], px[1], px[2]],
            ChannelOrder::Bgr => [px[2], px[1], px[0]],
        }
    }

    /// Consume the frame and return its pixels in RGB order.
    pub fn into_rgb_bytes(self) -> Vec<u8> {
        match self.order {
            ChannelOrder::Rgb => self.data,
            ChannelOrder::Bgr => {
                let mut data = self.data;
                for px in data.chunks_exact_mut(3) {
                    px.swap(0, 2);
                }
                data
            }
        }
    }
}

/// Normalized model-input frame: RGB, `f32` in `[0, 1]`, shape `(H, W, 3)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame(Array3<f32>);

impl Frame {
    /// Wrap an `(H, W, 3)` array.
    pub fn from_array(array: Array3<f32>) -> MediaResult<Self> {
        let (h, w, c) = array.dim();
        if c != 3 || h == 0 || w == 0 {
            return Err(MediaError::InvalidFrame(format!(
                "expected (H, W, 3) frame, got ({}, {}, {})",
                h, w, c
            )));
        }
        Ok(Self(array))
    }

    pub(crate) fn from_array_unchecked(array: Array3<f32>) -> Self {
        Self(array)
    }

    pub fn height(&self) -> usize {
        self.0.dim().0
    }

    pub fn width(&self) -> usize {
        self.0.dim().1
    }

    pub fn view(&self) -> ArrayView3<'_, f32> {
        self.0.view()
    }

    pub fn as_array(&self) -> &Array3<f32> {
        &self.0
    }

    /// Quantize back to an 8-bit RGB frame.
    pub fn to_rgb8(&self) -> RawFrame {
        let data = self
            .0
            .iter()
            .map(|v| (v.clamp(0.0, 1.0) * 255.0).round() as u8)
            .collect();

        RawFrame {
            width: self.width() as u32,
            height: self.height() as u32,
            order: ChannelOrder::Rgb,
            data,
        }
    }
}
