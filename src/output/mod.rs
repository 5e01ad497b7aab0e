mod loopback;

pub use loopback::V4L2Output;

use anyhow::Result;
use image::RgbImage;

/// Fixed display size for composited frames
pub const DISPLAY_WIDTH: u32 = 800;
pub const DISPLAY_HEIGHT: u32 = 600;

/// Consumer of composited frames
pub trait OutputSink {
    /// Write a frame to the output
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;

    /// Get the expected output resolution
    fn resolution(&self) -> (u32, u32);
}
