use image::{GenericImageView, RgbImage};
use tracing::debug;

use crate::{
    algorithms::hsv,
    types::{ColorCategory, HsvMean, Region},
};

/// Predicate over the mean hue of a region
pub type HuePredicate = fn(f64) -> bool;

/// Hue decision table, evaluated top to bottom; first match wins.
///
/// Hues in (10, 35), (85, 90) and (130, 160) match no rule and fall back
/// to [`ColorCategory::Unknown`].
pub const HUE_RULES: &[(HuePredicate, ColorCategory)] = &[
    (is_red, ColorCategory::Red),
    (is_blue, ColorCategory::Blue),
    (is_green, ColorCategory::Green),
];

/// Red wraps around the hue circle
pub fn is_red(hue: f64) -> bool {
    hue < 10.0 || hue > 160.0
}

pub fn is_blue(hue: f64) -> bool {
    90.0 < hue && hue < 130.0
}

pub fn is_green(hue: f64) -> bool {
    35.0 < hue && hue < 85.0
}

/// Category for a mean HSV triple; only the hue takes part
pub fn classify_hsv(mean: &HsvMean) -> ColorCategory {
    HUE_RULES
        .iter()
        .find(|(matches, _)| matches(mean.hue))
        .map(|(_, category)| *category)
        .unwrap_or(ColorCategory::Unknown)
}

/// Classifies a region by the mean colour of the original pixels under it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColorClassifier;

impl ColorClassifier {
    pub fn classify(&self, image: &RgbImage, region: &Region) -> ColorCategory {
        match self.mean_color(image, region) {
            Some(mean) => classify_hsv(&mean),
            None => {
                debug!(?region, "Empty crop, classifying as UNKNOWN");
                ColorCategory::Unknown
            }
        }
    }

    /// Mean HSV of the crop, clipped to the image; `None` if nothing is left
    pub fn mean_color(&self, image: &RgbImage, region: &Region) -> Option<HsvMean> {
        let (width, height) = image.dimensions();
        if region.x >= width || region.y >= height {
            return None;
        }
        let crop_width = region.width.min(width - region.x);
        let crop_height = region.height.min(height - region.y);
        let crop = image.view(region.x, region.y, crop_width, crop_height);
        hsv::mean_hsv(&*crop)
    }
}
