use super::segment::brightness;
use crate::capture::CaptureSource;
use image::{GrayImage, RgbImage};

/// Frames thrown away before capturing, so exposure and white balance can settle
pub const DEFAULT_WARMUP_FRAMES: u32 = 30;

/// Reads allowed after warm-up before giving up on a capture
pub const CAPTURE_ATTEMPTS: u32 = 10;

/// A captured reference frame and its brightness channel
#[derive(Debug, Clone)]
pub struct Background {
    frame: RgbImage,
    brightness: GrayImage,
}

impl Background {
    pub fn new(frame: RgbImage) -> Self {
        let brightness = brightness(&frame);
        Self { frame, brightness }
    }

    pub fn frame(&self) -> &RgbImage {
        &self.frame
    }

    /// HSV value channel of the captured frame
    pub fn brightness(&self) -> &GrayImage {
        &self.brightness
    }

    /// Brightness channel as floats, row-major
    pub fn brightness_f32(&self) -> Vec<f32> {
        self.brightness.pixels().map(|p| p.0[0] as f32).collect()
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.frame.dimensions()
    }
}

/// Result of a capture request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaptureOutcome {
    Captured { width: u32, height: u32 },
    /// No frame could be read; the previous background (if any) is untouched
    NoFrame,
}

impl CaptureOutcome {
    pub fn is_captured(&self) -> bool {
        matches!(self, CaptureOutcome::Captured { .. })
    }
}

/// Holds at most one background for the lifetime of the pipeline
#[derive(Debug, Default)]
pub struct BackgroundStore {
    background: Option<Background>,
}

impl BackgroundStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Background> {
        self.background.as_ref()
    }

    pub fn is_captured(&self) -> bool {
        self.background.is_some()
    }

    pub fn set(&mut self, frame: RgbImage) {
        self.background = Some(Background::new(frame));
    }

    pub fn clear(&mut self) -> Option<Background> {
        self.background.take()
    }

    /// Read a fresh background from `source`
    ///
    /// Blocks for `warmup` discarded reads plus up to `CAPTURE_ATTEMPTS` more.
    pub fn capture<C>(&mut self, source: &mut C, warmup: u32) -> CaptureOutcome
    where
        C: CaptureSource + ?Sized,
    {
        let _span = tracing::debug_span!("capture_background", warmup).entered();
        tracing::info!("Capturing background ({} warm-up frames)", warmup);

        for i in 0..warmup {
            if let Err(e) = source.capture_frame() {
                tracing::debug!("Warm-up read {} failed: {:#}", i, e);
            }
        }

        for attempt in 0..CAPTURE_ATTEMPTS {
            match source.capture_frame() {
                Ok(frame) => {
                    let (width, height) = frame.dimensions();
                    self.set(frame);
                    tracing::info!("Background captured at {}x{}", width, height);
                    return CaptureOutcome::Captured { width, height };
                }
                Err(e) => tracing::debug!("Capture attempt {} failed: {:#}", attempt, e),
            }
        }

        tracing::warn!("Background capture failed: no frame after warm-up, keeping previous state");
        CaptureOutcome::NoFrame
    }
}
