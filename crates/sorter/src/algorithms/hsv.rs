//! 8-bit HSV helpers: hue in `0..180`, saturation and value in `0..=255`.
//!
//! HSV images reuse `RgbImage` storage with the channels holding
//! `[h, s, v]`, so the usual `image`/`imageproc` operations apply to them.

use image::{GenericImageView, GrayImage, Luma, Rgb, Rgb32FImage, RgbImage};

use crate::types::HsvMean;

/// RGB image whose channels hold `[h, s, v]`
pub type HsvImage = RgbImage;

/// Fixed kernel a zero-sigma 5x5 Gaussian resolves to
pub const BLUR_KERNEL_5: [f32; 5] = [1.0 / 16.0, 4.0 / 16.0, 6.0 / 16.0, 4.0 / 16.0, 1.0 / 16.0];

/// Convert one RGB sample to 8-bit HSV. Achromatic samples get hue 0.
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> Rgb<u8> {
    let [r, g, b] = pixel.0.map(f32::from);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let saturation = if max > 0.0 { (255.0 * delta / max).round() } else { 0.0 };

    let degrees = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * (g - b) / delta
    } else if max == g {
        120.0 + 60.0 * (b - r) / delta
    } else {
        240.0 + 60.0 * (r - g) / delta
    };
    let degrees = if degrees < 0.0 { degrees + 360.0 } else { degrees };
    let hue = (degrees / 2.0).round() as u8 % 180;

    Rgb([hue, saturation as u8, max as u8])
}

pub fn to_hsv(image: &RgbImage) -> HsvImage {
    imageproc::map::map_colors(image, rgb_to_hsv)
}

/// 5x5 separable binomial blur, applied to every channel independently.
///
/// Accumulates in `f32`, mirrors the border without repeating the edge
/// sample (`dcb|abcd|cba`) and rounds back to 8 bits.
pub fn blur_5x5(image: &HsvImage) -> HsvImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    let horizontal = Rgb32FImage::from_fn(width, height, |x, y| {
        convolve(|offset| {
            let sx = reflect_101(x as i64 + offset, width);
            image.get_pixel(sx, y).0.map(f32::from)
        })
    });

    RgbImage::from_fn(width, height, |x, y| {
        let sum = convolve(|offset| horizontal.get_pixel(x, reflect_101(y as i64 + offset, height)).0);
        Rgb(sum.0.map(|v| v.round().clamp(0.0, 255.0) as u8))
    })
}

/// Weighted sum of the samples at offsets `-2..=2`
fn convolve(sample: impl Fn(i64) -> [f32; 3]) -> Rgb<f32> {
    let radius = (BLUR_KERNEL_5.len() / 2) as i64;
    let mut sum = [0f32; 3];
    for (offset, weight) in (-radius..=radius).zip(BLUR_KERNEL_5) {
        for (acc, value) in sum.iter_mut().zip(sample(offset)) {
            *acc += weight * value;
        }
    }
    Rgb(sum)
}

/// Fold an out-of-range coordinate back into `0..len` by reflection
/// about the edge samples
fn reflect_101(index: i64, len: u32) -> u32 {
    let len = i64::from(len);
    if len == 1 {
        return 0;
    }
    let period = 2 * (len - 1);
    let folded = index.rem_euclid(period);
    (if folded < len { folded } else { period - folded }) as u32
}

/// Inclusive per-channel bounds on an HSV triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HsvRange {
    pub lower: [u8; 3],
    pub upper: [u8; 3],
}

impl HsvRange {
    pub const fn new(lower: [u8; 3], upper: [u8; 3]) -> Self {
        Self { lower, upper }
    }

    pub fn contains(&self, pixel: &Rgb<u8>) -> bool {
        pixel
            .0
            .iter()
            .zip(self.lower.iter().zip(self.upper.iter()))
            .all(|(value, (lo, hi))| lo <= value && value <= hi)
    }

    /// Binary mask: 255 where the pixel lies inside the range, 0 elsewhere
    pub fn mask(&self, image: &HsvImage) -> GrayImage {
        imageproc::map::map_colors(image, |pixel| {
            if self.contains(&pixel) { Luma([255u8]) } else { Luma([0u8]) }
        })
    }
}

/// Mean HSV over every pixel of an RGB view; `None` for an empty view
pub fn mean_hsv<V>(view: &V) -> Option<HsvMean>
where
    V: GenericImageView<Pixel = Rgb<u8>>,
{
    let (width, height) = view.dimensions();
    let count = u64::from(width) * u64::from(height);
    if count == 0 {
        return None;
    }

    let mut sums = [0u64; 3];
    for (_, _, pixel) in view.pixels() {
        let hsv = rgb_to_hsv(pixel);
        for (sum, channel) in sums.iter_mut().zip(hsv.0) {
            *sum += u64::from(channel);
        }
    }

    let count = count as f64;
    Some(HsvMean::new(
        sums[0] as f64 / count,
        sums[1] as f64 / count,
        sums[2] as f64 / count,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_hues() {
        assert_eq!(rgb_to_hsv(Rgb([255, 0, 0])), Rgb([0, 255, 255]));
        assert_eq!(rgb_to_hsv(Rgb([0, 255, 0])), Rgb([60, 255, 255]));
        assert_eq!(rgb_to_hsv(Rgb([0, 0, 255])), Rgb([120, 255, 255]));
    }

    #[test]
    fn test_achromatic_has_zero_hue_and_saturation() {
        assert_eq!(rgb_to_hsv(Rgb([128, 128, 128])), Rgb([0, 0, 128]));
        assert_eq!(rgb_to_hsv(Rgb([0, 0, 0])), Rgb([0, 0, 0]));
    }

    #[test]
    fn test_azure_maps_to_hue_110() {
        assert_eq!(rgb_to_hsv(Rgb([0, 85, 255])), Rgb([110, 255, 255]));
    }

    #[test]
    fn test_blur_preserves_flat_image() {
        let image = RgbImage::from_pixel(12, 9, Rgb([110, 255, 200]));
        let blurred = blur_5x5(&image);
        assert!(blurred.pixels().all(|p| *p == Rgb([110, 255, 200])));
    }

    #[test]
    fn test_blur_rounds_to_nearest() {
        let mut image = RgbImage::new(9, 9);
        image.put_pixel(4, 4, Rgb([255, 255, 255]));
        let blurred = blur_5x5(&image);
        // 255 * 36 / 256 = 35.86
        assert_eq!(*blurred.get_pixel(4, 4), Rgb([36, 36, 36]));
        // 255 * 24 / 256 = 23.9
        assert_eq!(*blurred.get_pixel(5, 4), Rgb([24, 24, 24]));
        assert_eq!(*blurred.get_pixel(6, 6), Rgb([1, 1, 1]));
    }

    #[test]
    fn test_blur_reflects_at_the_border() {
        let mut image = RgbImage::new(9, 9);
        image.put_pixel(0, 0, Rgb([255, 0, 0]));
        let blurred = blur_5x5(&image);
        // The corner sample is not repeated, so it keeps the centre weight
        assert_eq!(*blurred.get_pixel(0, 0), Rgb([36, 0, 0]));
        assert_eq!(*blurred.get_pixel(1, 0), Rgb([24, 0, 0]));
    }

    #[test]
    fn test_reflect_101_indices() {
        let folded: Vec<u32> = (-3..9).map(|i| reflect_101(i, 5)).collect();
        assert_eq!(folded, vec![3, 2, 1, 0, 1, 2, 3, 4, 3, 2, 1, 0]);
        assert_eq!(reflect_101(-2, 1), 0);
    }

    #[test]
    fn test_range_is_inclusive() {
        let range = HsvRange::new([90, 50, 50], [140, 255, 255]);
        assert!(range.contains(&Rgb([90, 50, 50])));
        assert!(range.contains(&Rgb([140, 255, 255])));
        assert!(!range.contains(&Rgb([89, 200, 200])));
        assert!(!range.contains(&Rgb([141, 200, 200])));
        assert!(!range.contains(&Rgb([100, 49, 200])));
    }

    #[test]
    fn test_mean_of_empty_view_is_none() {
        let image = RgbImage::new(10, 10);
        let view = image.view(3, 3, 0, 4);
        assert!(mean_hsv(&*view).is_none());
    }

    #[test]
    fn test_mean_of_two_halves() {
        let mut image = RgbImage::from_pixel(4, 2, Rgb([0, 255, 0]));
        for x in 0..4 {
            image.put_pixel(x, 1, Rgb([0, 0, 255]));
        }
        let mean = mean_hsv(&image).expect("non-empty");
        assert_eq!(mean.hue, 90.0);
        assert_eq!(mean.saturation, 255.0);
        assert_eq!(mean.value, 255.0);
    }
}
