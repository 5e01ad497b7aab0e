mod webcam;

pub use webcam::WebcamCapture;

use anyhow::Result;
use image::RgbImage;

/// Source of live frames for the cloak pipeline
pub trait CaptureSource {
    /// Capture a single frame, mirrored to match what the user sees in a mirror
    fn capture_frame(&mut self) -> Result<RgbImage>;

    /// Get the resolution of captured frames
    fn resolution(&self) -> (u32, u32);
}
