use std::fs;
use std::path::Path;

use ab_glyph::{Font, FontArc, FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::{
    drawing::{draw_hollow_rect_mut, draw_text_mut},
    rect::Rect,
};
use tracing::{debug, warn};

use crate::{
    error::{Result, SorterError},
    types::Region,
};

pub const ANNOTATION_COLOR: Rgb<u8> = Rgb([0, 255, 0]);

/// DejaVu Sans Mono, used for labels unless another font is configured
/// (Bitstream Vera license, see `assets/DejaVuSansMono-LICENSE.txt`)
static DEFAULT_FONT: &[u8] = include_bytes!("../../assets/DejaVuSansMono.ttf");

/// Gap between the label baseline area and the top of its rectangle
const LABEL_OFFSET: i32 = 10;

/// Draws region outlines and labels onto annotated copies
pub struct Annotator {
    font: Option<FontArc>,
    scale: PxScale,
    thickness: u32,
}

impl std::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Annotator")
            .field("has_font", &self.font.is_some())
            .field("scale", &self.scale)
            .field("thickness", &self.thickness)
            .finish()
    }
}

impl Default for Annotator {
    /// Labels in the embedded DejaVu Sans Mono
    fn default() -> Self {
        let font = match FontArc::try_from_slice(DEFAULT_FONT) {
            Ok(font) => Some(font),
            Err(e) => {
                warn!(error = %e, "Embedded label font is unusable, labels disabled");
                None
            }
        };
        Self { font, ..Self::outline_only() }
    }
}

impl Annotator {
    pub fn with_font<F: Font + Send + Sync + 'static>(font: F) -> Self {
        Self {
            font: Some(FontArc::new(font)),
            ..Self::outline_only()
        }
    }

    /// Rectangles only, no label text
    pub fn outline_only() -> Self {
        Self {
            font: None,
            scale: PxScale::from(18.0),
            thickness: 2,
        }
    }

    /// Load a TrueType/OpenType font for label text, replacing the
    /// embedded one
    pub fn from_font_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let font = FontVec::try_from_vec(bytes)
            .map_err(|e| SorterError::Font(format!("{}: {e}", path.display())))?;
        Ok(Self::with_font(font))
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    /// Outline `region` and write `label` just above it. Without a font
    /// only the outline is drawn.
    pub fn annotate(&self, image: &mut RgbImage, region: &Region, label: &str) {
        for inset in 0..self.thickness {
            let width = region.width.saturating_sub(2 * inset);
            let height = region.height.saturating_sub(2 * inset);
            if width == 0 || height == 0 {
                break;
            }
            let rect = Rect::at((region.x + inset) as i32, (region.y + inset) as i32).of_size(width, height);
            draw_hollow_rect_mut(image, rect, ANNOTATION_COLOR);
        }

        match &self.font {
            Some(font) => {
                let top = (region.y as i32 - LABEL_OFFSET - self.scale.y as i32).max(0);
                draw_text_mut(image, ANNOTATION_COLOR, region.x as i32, top, self.scale, font, label);
            }
            None => debug!(label, "Outline-only annotator, skipping label text"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BACKGROUND: Rgb<u8> = Rgb([10, 20, 30]);

    fn changed_pixels(image: &RgbImage, rows: std::ops::Range<u32>) -> usize {
        rows.flat_map(|y| (0..image.width()).map(move |x| (x, y)))
            .filter(|&(x, y)| *image.get_pixel(x, y) != BACKGROUND)
            .count()
    }

    #[test]
    fn test_outline_is_two_pixels_thick() {
        let mut image = RgbImage::from_pixel(40, 40, BACKGROUND);
        let region = Region { x: 5, y: 5, width: 20, height: 10, area: 200 };
        Annotator::outline_only().annotate(&mut image, &region, "Obj 1: BLUE -> BIN B");

        assert_eq!(*image.get_pixel(5, 5), ANNOTATION_COLOR);
        assert_eq!(*image.get_pixel(6, 6), ANNOTATION_COLOR);
        assert_eq!(*image.get_pixel(24, 14), ANNOTATION_COLOR);
        assert_eq!(*image.get_pixel(23, 13), ANNOTATION_COLOR);
        assert_eq!(*image.get_pixel(7, 7), BACKGROUND);
        assert_eq!(*image.get_pixel(4, 4), BACKGROUND);
        assert_eq!(*image.get_pixel(25, 15), BACKGROUND);
    }

    #[test]
    fn test_default_annotator_draws_label_above_region() {
        let region = Region { x: 10, y: 50, width: 60, height: 20, area: 1200 };

        let mut labelled = RgbImage::from_pixel(200, 100, BACKGROUND);
        let annotator = Annotator::default();
        assert!(annotator.has_font());
        annotator.annotate(&mut labelled, &region, "Obj 1: BLUE -> BIN B");

        let mut outlined = RgbImage::from_pixel(200, 100, BACKGROUND);
        Annotator::outline_only().annotate(&mut outlined, &region, "Obj 1: BLUE -> BIN B");

        assert!(changed_pixels(&labelled, 0..region.y) > 0);
        assert_eq!(changed_pixels(&outlined, 0..region.y), 0);
        // Below the label the two copies agree
        for y in region.y..100 {
            for x in 0..200 {
                assert_eq!(labelled.get_pixel(x, y), outlined.get_pixel(x, y));
            }
        }
    }

    #[test]
    fn test_label_on_thin_region() {
        let mut image = RgbImage::from_pixel(30, 40, BACKGROUND);
        let region = Region { x: 2, y: 30, width: 1, height: 6, area: 6 };
        Annotator::default().annotate(&mut image, &region, "Obj 12: UNKNOWN -> BIN C");
        assert_eq!(*image.get_pixel(2, 32), ANNOTATION_COLOR);
        assert!(changed_pixels(&image, 0..30) > 0);
    }

    #[test]
    fn test_custom_font_replaces_default() {
        let font = FontVec::try_from_vec(DEFAULT_FONT.to_vec()).expect("embedded font parses");
        let annotator = Annotator::with_font(font);
        assert!(annotator.has_font());
        assert!(!Annotator::outline_only().has_font());
    }

    #[test]
    fn test_missing_font_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        assert!(Annotator::from_font_file(dir.path().join("none.ttf")).is_err());

        let junk = dir.path().join("junk.ttf");
        fs::write(&junk, b"not a font").expect("write");
        assert!(matches!(Annotator::from_font_file(&junk), Err(SorterError::Font(_))));
    }
}
