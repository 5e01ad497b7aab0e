use super::types::{HsvRange, Mask, HUE_MAX};
use image::{GrayImage, Luma, RgbImage};

/// A pixel in 8-bit HSV: hue in [0, 180), saturation and value in [0, 255]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsv {
    pub hue: u8,
    pub sat: u8,
    pub val: u8,
}

/// Convert one RGB pixel to 8-bit HSV
///
/// Hue is stored as degrees / 2 so the full circle fits in a byte.
/// Achromatic pixels (max == min) get hue 0.
pub fn rgb_to_hsv([r, g, b]: [u8; 3]) -> Hsv {
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let diff = (max - min) as f32;

    let sat = if max == 0 {
        0
    } else {
        (255.0 * diff / max as f32).round() as u8
    };

    let hue = if diff == 0.0 {
        0
    } else {
        let (r, g, b) = (r as f32, g as f32, b as f32);
        let mut degrees = if max as f32 == r {
            60.0 * (g - b) / diff
        } else if max as f32 == g {
            120.0 + 60.0 * (b - r) / diff
        } else {
            240.0 + 60.0 * (r - g) / diff
        };
        if degrees < 0.0 {
            degrees += 360.0;
        }
        // 359.x degrees rounds up to a full turn
        let half = (degrees / 2.0).round() as u16;
        (half % HUE_MAX as u16) as u8
    };

    Hsv { hue, sat, val: max }
}

/// Classify every pixel of `frame` against `range`
///
/// Returns a mask that is 255 where hue, saturation and value all fall inside the
/// band and 0 elsewhere. An inverted hue band (low > high) produces an empty mask.
pub fn segment(frame: &RgbImage, range: &HsvRange) -> Mask {
    let _span = tracing::debug_span!("segment").entered();

    let (width, height) = frame.dimensions();
    let mut mask = Mask::new(width, height);

    if range.is_empty() {
        tracing::debug!(
            "Hue band {}..{} is inverted, nothing will be cloaked",
            range.hue_low,
            range.hue_high
        );
        return mask;
    }

    for (src, dst) in frame.pixels().zip(mask.pixels_mut()) {
        let hsv = rgb_to_hsv(src.0);
        if range.contains(hsv.hue, hsv.sat, hsv.val) {
            dst.0[0] = 255;
        }
    }

    mask
}

/// HSV value channel of a frame
pub fn brightness(frame: &RgbImage) -> GrayImage {
    GrayImage::from_fn(frame.width(), frame.height(), |x, y| {
        Luma([rgb_to_hsv(frame.get_pixel(x, y).0).val])
    })
}
