use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;

use crate::{error::Result, traits::ImageLoader};

/// Image files directly inside `dir` whose extension is one of
/// `extensions` (case-insensitive), sorted by file name.
pub fn discover_images<S: AsRef<str>>(dir: &Path, extensions: &[S]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if !path.is_file() {
            continue;
        }
        let matches = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| extensions.iter().any(|wanted| wanted.as_ref().eq_ignore_ascii_case(ext)))
            .unwrap_or(false);
        if matches {
            images.push(path);
        }
    }
    images.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(images)
}

/// Decodes files with the `image` crate, whatever the format, into 8-bit RGB
#[derive(Debug, Clone, Copy, Default)]
pub struct FsImageLoader;

impl ImageLoader for FsImageLoader {
    fn load(&self, source: &Path) -> Result<RgbImage> {
        Ok(image::open(source)?.to_rgb8())
    }
}
