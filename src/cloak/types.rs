use image::{GrayImage, ImageBuffer, Luma};

/// Binary occlusion mask: 255 where the cloak color was detected, 0 elsewhere
/// Dimensions match the frame it was derived from
pub type Mask = GrayImage;

/// Per-pixel blend weight in [0, 1]: 1.0 selects the background, 0.0 the live frame
pub type AlphaMap = ImageBuffer<Luma<f32>, Vec<f32>>;

/// Upper bound of the 8-bit hue scale (degrees / 2)
pub const HUE_MAX: u8 = 180;

/// Upper bound of the edge growth control
pub const EDGE_GROWTH_MAX: u32 = 15;

/// Upper bound of the feather control
pub const FEATHER_MAX: u32 = 61;

/// Color band that counts as "cloak"
///
/// Hue uses the 8-bit convention (0..=180). Saturation and value only have a
/// floor; their ceiling is always 255.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub hue_low: u8,
    pub hue_high: u8,
    pub sat_low: u8,
    pub val_low: u8,
}

impl HsvRange {
    pub const fn new(hue_low: u8, hue_high: u8, sat_low: u8, val_low: u8) -> Self {
        Self {
            hue_low,
            hue_high,
            sat_low,
            val_low,
        }
    }

    /// An inverted hue band selects nothing
    pub fn is_empty(&self) -> bool {
        self.hue_low > self.hue_high
    }

    pub fn contains(&self, hue: u8, sat: u8, val: u8) -> bool {
        hue >= self.hue_low && hue <= self.hue_high && sat >= self.sat_low && val >= self.val_low
    }
}

impl Default for HsvRange {
    fn default() -> Self {
        Preset::Green.range()
    }
}

/// Starting points for common cloak colors
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Preset {
    Green,
    Red,
    Blue,
}

impl Preset {
    pub fn range(self) -> HsvRange {
        match self {
            Preset::Green => HsvRange::new(35, 85, 100, 50),
            Preset::Red => HsvRange::new(0, 10, 120, 70),
            Preset::Blue => HsvRange::new(100, 130, 150, 50),
        }
    }
}

/// Snapshot of the tunable parameters, taken once per tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CloakParams {
    pub range: HsvRange,
    /// Extra dilation passes after the morphological close
    pub edge_growth: u32,
    /// Gaussian kernel size for feathering; even values are bumped to the next odd size
    pub feather: u32,
}

impl CloakParams {
    /// Clamp every field into the range the control surface can produce
    pub fn clamped(self) -> Self {
        Self {
            range: HsvRange {
                hue_low: self.range.hue_low.min(HUE_MAX),
                hue_high: self.range.hue_high.min(HUE_MAX),
                ..self.range
            },
            edge_growth: self.edge_growth.min(EDGE_GROWTH_MAX),
            feather: self.feather.min(FEATHER_MAX),
        }
    }
}

impl Default for CloakParams {
    fn default() -> Self {
        Self {
            range: HsvRange::default(),
            edge_growth: 3,
            feather: 25,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamped_limits_every_field() {
        let params = CloakParams {
            range: HsvRange::new(200, 250, 10, 20),
            edge_growth: 40,
            feather: 99,
        }
        .clamped();

        assert_eq!(params.range, HsvRange::new(180, 180, 10, 20));
        assert_eq!(params.edge_growth, EDGE_GROWTH_MAX);
        assert_eq!(params.feather, FEATHER_MAX);
    }

    #[test]
    fn inverted_hue_band_is_empty() {
        assert!(HsvRange::new(90, 10, 0, 0).is_empty());
        assert!(!HsvRange::new(10, 10, 0, 0).is_empty());
    }

    #[test]
    fn default_params_use_green_preset() {
        let params = CloakParams::default();
        assert_eq!(params.range, Preset::Green.range());
        assert_eq!(params.edge_growth, 3);
        assert_eq!(params.feather, 25);
    }
}
