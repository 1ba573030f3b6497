//! Model input geometry.

/// Number of frames in one model input sequence.
pub const NUM_FRAMES: usize = 10;

/// Frame height expected by the model, in pixels.
pub const FRAME_HEIGHT: u32 = 224;

/// Frame width expected by the model, in pixels.
pub const FRAME_WIDTH: u32 = 224;

/// Number of outputs produced per model invocation (four categorical heads
/// followed by the attention score).
pub const OUTPUT_HEAD_COUNT: usize = 5;
