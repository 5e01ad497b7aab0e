use super::types::Mask;
use imageproc::filter::median_filter;

/// Median neighbourhood radius (7x7 window)
const MEDIAN_RADIUS: u32 = 3;

/// Weight of the current frame in the temporal blend
const TEMPORAL_WEIGHT: f32 = 0.5;

/// Re-binarization cut-off, tied to `TEMPORAL_WEIGHT` == 0.5
const BINARY_THRESHOLD: u8 = 127;

/// Removes per-pixel sparkle and frame-to-frame shimmer from raw masks
///
/// Keeps exactly one mask across ticks: the last stabilized result.
#[derive(Debug, Default)]
pub struct MaskStabilizer {
    previous: Option<Mask>,
}

impl MaskStabilizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Median filter, blend with the previous result, then re-binarize
    ///
    /// The first call (or the first after `reset`) blends against an empty mask.
    pub fn stabilize(&mut self, raw: &Mask) -> Mask {
        let _span = tracing::debug_span!("stabilize").entered();

        let mut mask = median_filter(raw, MEDIAN_RADIUS, MEDIAN_RADIUS);

        let previous = self
            .previous
            .take()
            .filter(|prev| prev.dimensions() == mask.dimensions());

        match previous {
            Some(prev) => {
                for (cur, prev) in mask.pixels_mut().zip(prev.pixels()) {
                    cur.0[0] = binarize(blend(cur.0[0], prev.0[0]));
                }
            }
            None => {
                for cur in mask.pixels_mut() {
                    cur.0[0] = binarize(blend(cur.0[0], 0));
                }
            }
        }

        self.previous = Some(mask.clone());
        mask
    }

    /// Forget the retained mask
    pub fn reset(&mut self) {
        if self.previous.take().is_some() {
            tracing::debug!("Mask stabilizer state cleared");
        }
    }

    pub fn previous(&self) -> Option<&Mask> {
        self.previous.as_ref()
    }
}

fn blend(current: u8, previous: u8) -> u8 {
    let mixed = TEMPORAL_WEIGHT * current as f32 + (1.0 - TEMPORAL_WEIGHT) * previous as f32;
    mixed.round().clamp(0.0, 255.0) as u8
}

fn binarize(value: u8) -> u8 {
    if value > BINARY_THRESHOLD {
        255
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn block_mask() -> Mask {
        // 12x12 square in the middle of a 24x24 frame
        Mask::from_fn(24, 24, |x, y| {
            if (6..18).contains(&x) && (6..18).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        })
    }

    #[test]
    fn isolated_pixels_are_removed() {
        let mut raw = Mask::new(16, 16);
        raw.put_pixel(4, 4, Luma([255]));
        raw.put_pixel(11, 9, Luma([255]));

        let mut stabilizer = MaskStabilizer::new();
        let mask = stabilizer.stabilize(&raw);
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn median_window_is_seven_wide() {
        // 16 of 49 pixels in a 7x7 window; a 5x5 window would keep it
        let raw = Mask::from_fn(20, 20, |x, y| {
            if (8..12).contains(&x) && (8..12).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        });

        let mut stabilizer = MaskStabilizer::new();
        let mask = stabilizer.stabilize(&raw);
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }

    #[test]
    fn output_is_always_binary() {
        let raw = Mask::from_fn(20, 20, |x, y| Luma([if (x * 7 + y * 3) % 5 < 2 { 255 } else { 0 }]));
        let mut stabilizer = MaskStabilizer::new();
        for _ in 0..3 {
            let mask = stabilizer.stabilize(&raw);
            assert!(mask.pixels().all(|p| p.0[0] == 0 || p.0[0] == 255));
        }
    }

    #[test]
    fn identical_inputs_converge_within_one_tick() {
        let raw = block_mask();
        let mut stabilizer = MaskStabilizer::new();

        let first = stabilizer.stabilize(&raw);
        let second = stabilizer.stabilize(&raw);
        let third = stabilizer.stabilize(&raw);

        assert_eq!(second, first);
        assert_eq!(third, second);
        // A solid block survives the 7x7 median at its centre
        assert_eq!(second.get_pixel(12, 12).0[0], 255);
        assert_eq!(second.get_pixel(1, 1).0[0], 0);
    }

    #[test]
    fn result_is_retained_for_next_tick() {
        let mut stabilizer = MaskStabilizer::new();
        assert!(stabilizer.previous().is_none());

        let mask = stabilizer.stabilize(&block_mask());
        assert_eq!(stabilizer.previous(), Some(&mask));

        stabilizer.reset();
        assert!(stabilizer.previous().is_none());
    }

    #[test]
    fn previous_mask_carries_one_frame() {
        let mut stabilizer = MaskStabilizer::new();
        stabilizer.stabilize(&block_mask());

        // Region vanishes from the raw mask; the blend keeps it for this tick
        let lagged = stabilizer.stabilize(&Mask::new(24, 24));
        assert_eq!(lagged.get_pixel(12, 12).0[0], 255);
    }

    #[test]
    fn mismatched_previous_is_ignored() {
        let mut stabilizer = MaskStabilizer::new();
        stabilizer.stabilize(&block_mask());

        let mask = stabilizer.stabilize(&Mask::new(8, 8));
        assert_eq!(mask.dimensions(), (8, 8));
        assert!(mask.pixels().all(|p| p.0[0] == 0));
    }
}
