//! Frame normalization to model input format.

use engage_models::{FRAME_HEIGHT, FRAME_WIDTH};
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use ndarray::Array3;

use crate::frame::{Frame, RawFrame};

/// Converts decoded frames to the layout the model was trained on:
/// RGB order, fixed resolution, `f32` values in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameNormalizer {
    width: u32,
    height: u32,
}

impl Default for FrameNormalizer {
    fn default() -> Self {
        Self::new(FRAME_WIDTH, FRAME_HEIGHT)
    }
}

impl FrameNormalizer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Normalize one frame.
    ///
    /// Frames already at the target size are not resampled, which keeps
    /// normalization of an already-normalized frame exact.
    pub fn normalize(&self, raw: &RawFrame) -> Frame {
        let shape = (self.height as usize, self.width as usize, 3);

        if raw.width() == self.width && raw.height() == self.height {
            let array = Array3::from_shape_fn(shape, |(y, x, c)| {
                f32::from(raw.rgb_at(x as u32, y as u32)[c]) / 255.0
            });
            return Frame::from_array_unchecked(array);
        }

        let source = RgbImage::from_fn(raw.width(), raw.height(), |x, y| Rgb(raw.rgb_at(x, y)));
        let resized = imageops::resize(&source, self.width, self.height, FilterType::Triangle);

        let array = Array3::from_shape_fn(shape, |(y, x, c)| {
            f32::from(resized.get_pixel(x as u32, y as u32)[c]) / 255.0
        });
        Frame::from_array_unchecked(array)
    }
}
