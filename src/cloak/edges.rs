use super::types::Mask;
use imageproc::distance_transform::Norm;
use imageproc::morphology::{close, dilate_mut};

/// Chebyshev radius of the structuring element (5x5 square)
const ELEMENT_RADIUS: u8 = 2;

/// Fill pinholes in the mask and optionally grow it outward
///
/// A 5x5 close runs first; `edge_growth` extra dilations with the same
/// element follow. Growth of 0 leaves the closed mask as is.
pub fn shape_edges(mask: &Mask, edge_growth: u32) -> Mask {
    let _span = tracing::debug_span!("shape_edges", edge_growth).entered();

    let mut shaped = close(mask, Norm::LInf, ELEMENT_RADIUS);
    for _ in 0..edge_growth {
        dilate_mut(&mut shaped, Norm::LInf, ELEMENT_RADIUS);
    }
    shaped
}
