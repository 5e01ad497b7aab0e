use super::background::{BackgroundStore, CaptureOutcome};
use super::composite::composite;
use super::edges::shape_edges;
use super::feather::feather;
use super::segment::segment;
use super::stabilize::MaskStabilizer;
use super::types::{AlphaMap, CloakParams};
use crate::capture::CaptureSource;
use image::RgbImage;

/// What one tick produced
#[derive(Debug, Clone)]
pub struct TickOutput {
    pub frame: RgbImage,
    /// Alpha used for the blend; `None` in pass-through mode
    pub alpha: Option<AlphaMap>,
}

impl TickOutput {
    fn passthrough(frame: RgbImage) -> Self {
        Self { frame, alpha: None }
    }

    pub fn is_passthrough(&self) -> bool {
        self.alpha.is_none()
    }
}

/// All state that survives between ticks: the background and the last stabilized mask
///
/// One instance per camera; independent instances never share state.
#[derive(Debug, Default)]
pub struct CloakPipeline {
    background: BackgroundStore,
    stabilizer: MaskStabilizer,
}

impl CloakPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_background(&self) -> bool {
        self.background.is_captured()
    }

    /// Capture a new background, blocking for the warm-up reads
    pub fn capture_background<C>(&mut self, source: &mut C, warmup: u32) -> CaptureOutcome
    where
        C: CaptureSource + ?Sized,
    {
        let outcome = self.background.capture(source, warmup);
        if outcome.is_captured() {
            self.stabilizer.reset();
        }
        outcome
    }

    /// Install a background directly
    pub fn set_background(&mut self, frame: RgbImage) {
        self.background.set(frame);
        self.stabilizer.reset();
    }

    /// Drop the background and return to pass-through
    pub fn clear_background(&mut self) {
        if self.background.clear().is_some() {
            tracing::info!("Background cleared, passing frames through");
        }
        self.stabilizer.reset();
    }

    /// Run one frame through segment, stabilize, shape, feather and composite
    pub fn process(&mut self, frame: RgbImage, params: &CloakParams) -> TickOutput {
        let _span = tracing::debug_span!("cloak_tick").entered();

        let Some(background) = self.background.get() else {
            return TickOutput::passthrough(frame);
        };

        if background.dimensions() != frame.dimensions() {
            tracing::warn!(
                "Frame size {:?} differs from background {:?}, recapture required",
                frame.dimensions(),
                background.dimensions()
            );
            self.clear_background();
            return TickOutput::passthrough(frame);
        }

        let params = params.clamped();
        let raw = segment(&frame, &params.range);
        let stable = self.stabilizer.stabilize(&raw);
        let shaped = shape_edges(&stable, params.edge_growth);
        let alpha = feather(&shaped, params.feather);

        match composite(background.frame(), &frame, &alpha) {
            Ok(out) => TickOutput {
                frame: out,
                alpha: Some(alpha),
            },
            Err(e) => {
                tracing::warn!("Compositing skipped: {}", e);
                TickOutput::passthrough(frame)
            }
        }
    }
}
