use super::types::AlphaMap;
use crate::error::CloakError;
use image::RgbImage;

/// Blend `background` over `frame` using `alpha` as the background weight
///
/// Every channel is computed as `B * a + F * (1 - a)` in floating point, then
/// rounded and clamped back to 8 bits. All three inputs must share dimensions.
pub fn composite(
    background: &RgbImage,
    frame: &RgbImage,
    alpha: &AlphaMap,
) -> Result<RgbImage, CloakError> {
    let _span = tracing::debug_span!("composite").entered();

    let expected = frame.dimensions();
    check_dimensions("background", expected, background.dimensions())?;
    check_dimensions("alpha map", expected, alpha.dimensions())?;

    let mut out = RgbImage::new(expected.0, expected.1);
    for (((dst, bg), fg), a) in out
        .pixels_mut()
        .zip(background.pixels())
        .zip(frame.pixels())
        .zip(alpha.pixels())
    {
        let a = a.0[0].clamp(0.0, 1.0);
        for c in 0..3 {
            let mixed = bg.0[c] as f32 * a + fg.0[c] as f32 * (1.0 - a);
            dst.0[c] = mixed.round().clamp(0.0, 255.0) as u8;
        }
    }

    Ok(out)
}

fn check_dimensions(
    what: &'static str,
    expected: (u32, u32),
    actual: (u32, u32),
) -> Result<(), CloakError> {
    if expected == actual {
        Ok(())
    } else {
        Err(CloakError::DimensionMismatch {
            what,
            expected,
            actual,
        })
    }
}
