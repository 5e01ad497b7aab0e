use super::types::{AlphaMap, Mask};
use image::{GrayImage, ImageBuffer, Luma, Rgb, RgbImage};
use imageproc::filter::separable_filter_equal;

/// Gaussian kernels must have an odd side; even requests are bumped by one
pub fn effective_kernel_size(feather: u32) -> u32 {
    if feather % 2 == 0 {
        feather + 1
    } else {
        feather
    }
}

/// Sigma implied by a kernel size when no explicit sigma is given
fn sigma_for(size: u32) -> f32 {
    0.3 * ((size as f32 - 1.0) * 0.5 - 1.0) + 0.8
}

/// Normalized 1-D Gaussian weights of length `size`
fn gaussian_kernel(size: u32) -> Vec<f32> {
    let sigma = sigma_for(size);
    let center = (size / 2) as f32;
    let mut weights: Vec<f32> = (0..size)
        .map(|i| {
            let d = i as f32 - center;
            (-(d * d) / (2.0 * sigma * sigma)).exp()
        })
        .collect();
    let sum: f32 = weights.iter().sum();
    weights.iter_mut().for_each(|w| *w /= sum);
    weights
}

/// Gaussian blur of a binary mask, rounded back to 8-bit levels
///
/// Filtering happens in f32 so a uniform mask keeps its exact value.
fn gaussian_blur(mask: &GrayImage, size: u32) -> GrayImage {
    if size <= 1 {
        return mask.clone();
    }

    let kernel = gaussian_kernel(size);
    let levels: ImageBuffer<Luma<f32>, Vec<f32>> =
        ImageBuffer::from_fn(mask.width(), mask.height(), |x, y| {
            Luma([mask.get_pixel(x, y).0[0] as f32])
        });
    let blurred = separable_filter_equal(&levels, &kernel);

    GrayImage::from_fn(mask.width(), mask.height(), |x, y| {
        Luma([blurred.get_pixel(x, y).0[0].round().clamp(0.0, 255.0) as u8])
    })
}

/// Turn a hard mask into a soft alpha map in [0, 1]
pub fn feather(mask: &Mask, feather: u32) -> AlphaMap {
    let size = effective_kernel_size(feather);
    let _span = tracing::debug_span!("feather", kernel = size).entered();

    let soft = gaussian_blur(mask, size);
    AlphaMap::from_fn(soft.width(), soft.height(), |x, y| {
        Luma([soft.get_pixel(x, y).0[0] as f32 / 255.0])
    })
}

/// Render an alpha map as a grey RGB image for visual inspection
pub fn alpha_to_rgb(alpha: &AlphaMap) -> RgbImage {
    RgbImage::from_fn(alpha.width(), alpha.height(), |x, y| {
        let value = (alpha.get_pixel(x, y).0[0] * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb([value, value, value])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn half_mask() -> Mask {
        Mask::from_fn(30, 10, |x, _| Luma([if x < 15 { 255 } else { 0 }]))
    }

    #[test]
    fn kernel_size_is_always_odd() {
        for k in 0..=61 {
            let size = effective_kernel_size(k);
            assert_eq!(size % 2, 1);
            assert_eq!(size, if k % 2 == 1 { k } else { k + 1 });
        }
    }

    #[test]
    fn kernel_weights_sum_to_one() {
        for size in [3, 5, 25, 61] {
            let sum: f32 = gaussian_kernel(size).iter().sum();
            assert!((sum - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn zero_feather_is_the_scaled_mask() {
        let mask = half_mask();
        let alpha = feather(&mask, 0);
        for (a, m) in alpha.pixels().zip(mask.pixels()) {
            assert_eq!(a.0[0], m.0[0] as f32 / 255.0);
        }
    }

    #[test]
    fn feathering_softens_the_edge() {
        let alpha = feather(&half_mask(), 9);

        assert_eq!(alpha.get_pixel(0, 5).0[0], 1.0);
        assert_eq!(alpha.get_pixel(29, 5).0[0], 0.0);

        let left = alpha.get_pixel(14, 5).0[0];
        let right = alpha.get_pixel(15, 5).0[0];
        assert!(left > 0.0 && left < 1.0);
        assert!(right > 0.0 && right < 1.0);
        assert!(left > right);
    }

    #[test]
    fn uniform_masks_stay_uniform() {
        let full = Mask::from_pixel(16, 16, Luma([255]));
        assert!(feather(&full, 25).pixels().all(|p| p.0[0] == 1.0));

        let empty = Mask::new(16, 16);
        assert!(feather(&empty, 25).pixels().all(|p| p.0[0] == 0.0));
    }

    #[test]
    fn full_mask_stays_opaque_for_every_kernel() {
        let full = Mask::from_pixel(70, 70, Luma([255]));
        for k in 0..=61 {
            let alpha = feather(&full, k);
            assert!(alpha.pixels().all(|p| p.0[0] == 1.0), "feather {k}");
        }
    }

    #[test]
    fn alpha_renders_as_grey() {
        let alpha = feather(&half_mask(), 0);
        let rgb = alpha_to_rgb(&alpha);
        assert_eq!(rgb.get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(rgb.get_pixel(29, 0), &Rgb([0, 0, 0]));
    }
}
