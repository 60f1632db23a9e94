use image::{GrayImage, Luma, RgbImage};
use imageproc::{
    contours::find_contours,
    point::Point,
    region_labelling::{connected_components, Connectivity},
};

use crate::{
    algorithms::hsv::{self, HsvRange},
    types::Region,
};

/// Blue-ish hues, any reasonably saturated and lit pixel
pub const BLUE_RANGE: HsvRange = HsvRange::new([90, 50, 50], [140, 255, 255]);

/// Regions enclosing fewer pixels than this are treated as noise
pub const MIN_REGION_AREA: u32 = 1000;

/// Finds candidate objects by HSV colour segmentation.
#[derive(Debug, Clone)]
pub struct RegionDetector {
    pub range: HsvRange,
    pub min_area: u32,
}

impl Default for RegionDetector {
    fn default() -> Self {
        Self {
            range: BLUE_RANGE,
            min_area: MIN_REGION_AREA,
        }
    }
}

impl RegionDetector {
    /// Regions of at least `min_area` pixels, in contour discovery order
    pub fn detect(&self, image: &RgbImage) -> Vec<Region> {
        let mask = self.segment(image);
        external_regions(&mask)
            .into_iter()
            .filter(|region| region.area >= self.min_area)
            .collect()
    }

    /// Binary foreground mask: HSV conversion, blur, then range threshold
    pub fn segment(&self, image: &RgbImage) -> GrayImage {
        let blurred = hsv::blur_5x5(&hsv::to_hsv(image));
        self.range.mask(&blurred)
    }
}

/// Bounding box and filled area of every external contour in `mask`.
///
/// Any non-zero pixel is foreground. Area counts every pixel the outer
/// boundary encloses, so holes inside an object add to its area. Objects
/// touching the image edge are reported like any other.
pub fn external_regions(mask: &GrayImage) -> Vec<Region> {
    // Top-level borders of edge-touching objects come back as holes
    let contours = find_contours::<i32>(mask);
    let starts: Vec<&Point<i32>> = contours
        .iter()
        .filter(|c| c.parent.is_none())
        .filter_map(|c| c.points.first())
        .collect();

    let labels = connected_components(&filled_objects(mask), Connectivity::Eight, Luma([0u8]));
    let mut extents: Vec<Option<Extent>> = Vec::new();
    let mut raster_order = Vec::new();
    for (x, y, label) in labels.enumerate_pixels() {
        let label = label[0] as usize;
        if label == 0 {
            continue;
        }
        if label >= extents.len() {
            extents.resize(label + 1, None);
        }
        extents[label] = Some(match extents[label] {
            Some(extent) => extent.include(x, y),
            None => {
                raster_order.push(label);
                Extent::at(x, y)
            }
        });
    }

    // Contour order first; objects spanning the full image width start no
    // contour at all and follow in raster order
    let contour_order = starts
        .into_iter()
        .map(|start| labels.get_pixel(start.x as u32, start.y as u32)[0] as usize);
    let mut seen = vec![false; extents.len()];
    contour_order
        .chain(raster_order)
        .filter_map(|label| {
            if std::mem::replace(seen.get_mut(label)?, true) {
                return None;
            }
            extents[label].map(Extent::region)
        })
        .collect()
}

/// Bounding box and pixel count of one labelled component
#[derive(Debug, Clone, Copy)]
struct Extent {
    min_x: u32,
    min_y: u32,
    max_x: u32,
    max_y: u32,
    count: u32,
}

impl Extent {
    fn at(x: u32, y: u32) -> Self {
        Self { min_x: x, min_y: y, max_x: x, max_y: y, count: 1 }
    }

    fn include(self, x: u32, y: u32) -> Self {
        Self {
            min_x: self.min_x.min(x),
            min_y: self.min_y.min(y),
            max_x: self.max_x.max(x),
            max_y: self.max_y.max(y),
            count: self.count + 1,
        }
    }

    fn region(self) -> Region {
        Region {
            x: self.min_x,
            y: self.min_y,
            width: self.max_x - self.min_x + 1,
            height: self.max_y - self.min_y + 1,
            area: self.count,
        }
    }
}

/// Mask with the holes of every object filled in: a pixel is set unless
/// it is background reachable from the image border.
fn filled_objects(mask: &GrayImage) -> GrayImage {
    let (width, height) = mask.dimensions();

    // One pixel of background frame so the outside is a single component
    let background = GrayImage::from_fn(width + 2, height + 2, |x, y| {
        let inside = x >= 1 && y >= 1 && x <= width && y <= height;
        if inside && mask.get_pixel(x - 1, y - 1)[0] != 0 {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    });
    let background_labels = connected_components(&background, Connectivity::Four, Luma([0u8]));
    let outside = background_labels.get_pixel(0, 0)[0];

    GrayImage::from_fn(width, height, |x, y| {
        if background_labels.get_pixel(x + 1, y + 1)[0] == outside {
            Luma([0u8])
        } else {
            Luma([255u8])
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    const GRAY: Rgb<u8> = Rgb([128, 128, 128]);
    const AZURE: Rgb<u8> = Rgb([0, 85, 255]);

    fn mask_with_rects(width: u32, height: u32, rects: &[(u32, u32, u32, u32)]) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for &(x0, y0, w, h) in rects {
            for y in y0..y0 + h {
                for x in x0..x0 + w {
                    mask.put_pixel(x, y, Luma([255u8]));
                }
            }
        }
        mask
    }

    fn fill_rect(image: &mut RgbImage, x0: u32, y0: u32, w: u32, h: u32, color: Rgb<u8>) {
        for y in y0..y0 + h {
            for x in x0..x0 + w {
                image.put_pixel(x, y, color);
            }
        }
    }

    #[test]
    fn test_rectangle_region_is_tight() {
        let mask = mask_with_rects(100, 80, &[(10, 15, 50, 40)]);
        let regions = external_regions(&mask);
        assert_eq!(regions, vec![Region { x: 10, y: 15, width: 50, height: 40, area: 2000 }]);
    }

    #[test]
    fn test_holes_are_ignored_and_counted_as_area() {
        let mut mask = mask_with_rects(60, 60, &[(5, 5, 40, 40)]);
        for y in 15..25 {
            for x in 15..25 {
                mask.put_pixel(x, y, Luma([0u8]));
            }
        }
        let regions = external_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 1600);
    }

    #[test]
    fn test_nested_object_is_not_reported() {
        let mut mask = mask_with_rects(80, 80, &[(0, 0, 60, 60)]);
        for y in 10..50 {
            for x in 10..50 {
                mask.put_pixel(x, y, Luma([0u8]));
            }
        }
        for y in 20..40 {
            for x in 20..40 {
                mask.put_pixel(x, y, Luma([255u8]));
            }
        }
        let regions = external_regions(&mask);
        assert_eq!(regions.len(), 1);
        assert_eq!(regions[0].area, 3600);
    }

    #[test]
    fn test_minimum_area_boundary() {
        let detector = RegionDetector::default();
        // 40x25 = 1000 stays, 37x27 = 999 goes
        let mask = mask_with_rects(200, 100, &[(5, 5, 40, 25), (100, 5, 37, 27)]);
        let kept: Vec<Region> = external_regions(&mask)
            .into_iter()
            .filter(|r| r.area >= detector.min_area)
            .collect();
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].area, 1000);
        assert_eq!((kept[0].x, kept[0].y), (5, 5));
    }

    #[test]
    fn test_regions_follow_scan_order() {
        let mask = mask_with_rects(200, 200, &[(120, 10, 40, 40), (10, 100, 40, 40), (10, 10, 40, 40)]);
        let origins: Vec<(u32, u32)> = external_regions(&mask).iter().map(|r| (r.x, r.y)).collect();
        assert_eq!(origins, vec![(10, 10), (120, 10), (10, 100)]);
    }

    #[test]
    fn test_object_in_top_left_corner() {
        let mask = mask_with_rects(100, 80, &[(0, 0, 40, 50)]);
        assert_eq!(
            external_regions(&mask),
            vec![Region { x: 0, y: 0, width: 40, height: 50, area: 2000 }]
        );
    }

    #[test]
    fn test_objects_on_each_edge() {
        let mask = mask_with_rects(
            200,
            150,
            &[(0, 60, 40, 30), (80, 0, 30, 40), (160, 50, 40, 30), (80, 110, 30, 40)],
        );
        let regions = external_regions(&mask);
        assert_eq!(regions.len(), 4);
        assert!(regions.iter().all(|r| r.area == 1200));
        assert!(regions.contains(&Region { x: 0, y: 60, width: 40, height: 30, area: 1200 }));
        assert!(regions.contains(&Region { x: 160, y: 50, width: 40, height: 30, area: 1200 }));
        assert!(regions.contains(&Region { x: 80, y: 110, width: 30, height: 40, area: 1200 }));
    }

    #[test]
    fn test_full_frame_object_with_hole() {
        let mut mask = mask_with_rects(50, 40, &[(0, 0, 50, 40)]);
        for y in 10..20 {
            for x in 10..20 {
                mask.put_pixel(x, y, Luma([0u8]));
            }
        }
        assert_eq!(
            external_regions(&mask),
            vec![Region { x: 0, y: 0, width: 50, height: 40, area: 2000 }]
        );
    }

    #[test]
    fn test_band_across_full_width() {
        let mask = mask_with_rects(50, 60, &[(0, 10, 50, 30)]);
        assert_eq!(
            external_regions(&mask),
            vec![Region { x: 0, y: 10, width: 50, height: 30, area: 1500 }]
        );
    }

    #[test]
    fn test_detect_blue_block_in_image_corner() {
        let mut image = RgbImage::from_pixel(120, 100, GRAY);
        fill_rect(&mut image, 0, 0, 52, 42, AZURE);
        // Mirrored borders keep the two image edges; only the inner edges erode
        let regions = RegionDetector::default().detect(&image);
        assert_eq!(regions, vec![Region { x: 0, y: 0, width: 51, height: 41, area: 2091 }]);
    }

    #[test]
    fn test_empty_mask_has_no_regions() {
        assert!(external_regions(&GrayImage::new(32, 32)).is_empty());
    }

    #[test]
    fn test_detect_blue_rectangle_on_gray() {
        let mut image = RgbImage::from_pixel(120, 100, GRAY);
        // The blur erodes one pixel on each side, leaving 50x40
        fill_rect(&mut image, 20, 20, 52, 42, AZURE);
        let regions = RegionDetector::default().detect(&image);
        assert_eq!(regions, vec![Region { x: 21, y: 21, width: 50, height: 40, area: 2000 }]);
    }

    #[test]
    fn test_detect_ignores_small_and_non_blue_blobs() {
        let mut image = RgbImage::from_pixel(200, 120, GRAY);
        fill_rect(&mut image, 10, 10, 20, 20, AZURE);
        fill_rect(&mut image, 60, 10, 80, 80, Rgb([255, 0, 0]));
        assert!(RegionDetector::default().detect(&image).is_empty());
    }

    #[test]
    fn test_detect_is_deterministic() {
        let mut image = RgbImage::from_pixel(160, 120, GRAY);
        fill_rect(&mut image, 5, 5, 60, 40, AZURE);
        fill_rect(&mut image, 80, 60, 70, 50, AZURE);
        let detector = RegionDetector::default();
        assert_eq!(detector.detect(&image), detector.detect(&image));
        assert_eq!(detector.detect(&image).len(), 2);
    }
}
