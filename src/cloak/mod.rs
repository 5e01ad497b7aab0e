//! Per-frame invisibility cloak: segment → stabilize → shape → feather → composite

mod background;
mod composite;
mod edges;
mod feather;
mod pipeline;
mod segment;
mod stabilize;
pub mod types;

pub use background::{Background, BackgroundStore, CaptureOutcome, DEFAULT_WARMUP_FRAMES};
pub use composite::composite;
pub use edges::shape_edges;
pub use feather::{alpha_to_rgb, effective_kernel_size, feather};
pub use pipeline::{CloakPipeline, TickOutput};
pub use segment::{rgb_to_hsv, segment, Hsv};
pub use stabilize::MaskStabilizer;
pub use types::{AlphaMap, CloakParams, HsvRange, Mask, Preset};
