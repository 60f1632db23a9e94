use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoEnumIterator, IntoStaticStr};

/// Timestamp layout used in the result log and console output.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Axis-aligned rectangle in image coordinates, plus the pixel area that
/// decided whether it passed the minimum-area filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
    pub area: u32,
}

impl Region {
    /// Exclusive right edge
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize,
    Display, EnumString, EnumIter, IntoStaticStr,
    PartialEq, Eq, Hash, PartialOrd, Ord,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum ColorCategory {
    Red,
    Blue,
    Green,
    Unknown,
}

#[derive(
    Debug, Clone, Copy,
    Serialize, Deserialize,
    Display, EnumString, EnumIter, IntoStaticStr,
    PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub enum BinId {
    #[serde(rename = "BIN A")]
    #[strum(serialize = "BIN A")]
    BinA,
    #[serde(rename = "BIN B")]
    #[strum(serialize = "BIN B")]
    BinB,
    #[serde(rename = "BIN C")]
    #[strum(serialize = "BIN C")]
    BinC,
}

/// Mean hue/saturation/value over a set of pixels, in the 8-bit HSV
/// convention (hue 0..180, saturation and value 0..255).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct HsvMean {
    pub hue: f64,
    pub saturation: f64,
    pub value: f64,
}

impl HsvMean {
    pub fn new(hue: f64, saturation: f64, value: f64) -> Self {
        Self { hue, saturation, value }
    }
}

/// One classified and binned object.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectionResult {
    pub timestamp: NaiveDateTime,
    /// Run-local id; starts at 1 for every run.
    pub object_id: u64,
    pub color: ColorCategory,
    pub bin: BinId,
    pub area: u32,
    pub region: Region,
    pub source: PathBuf,
}

impl DetectionResult {
    pub fn label(&self) -> String {
        format!("Obj {}: {} -> {}", self.object_id, self.color, self.bin)
    }

    pub fn formatted_timestamp(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// Per-bin object counts for one run. Every bin is always present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    counts: BTreeMap<BinId, usize>,
}

impl RunSummary {
    pub fn from_results(results: &[DetectionResult]) -> Self {
        let mut counts: BTreeMap<BinId, usize> = BinId::iter().map(|bin| (bin, 0)).collect();
        for result in results {
            *counts.entry(result.bin).or_insert(0) += 1;
        }
        Self { counts }
    }

    pub fn count(&self, bin: BinId) -> usize {
        self.counts.get(&bin).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    /// Bins in declaration order with their counts
    pub fn iter(&self) -> impl Iterator<Item = (BinId, usize)> + '_ {
        self.counts.iter().map(|(bin, count)| (*bin, *count))
    }
}

impl Default for RunSummary {
    fn default() -> Self {
        Self::from_results(&[])
    }
}

/// Everything a finished (or cancelled) run produced.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub images_found: usize,
    pub images_processed: usize,
    pub images_failed: Vec<PathBuf>,
    pub annotated_outputs: Vec<PathBuf>,
    pub results: Vec<DetectionResult>,
    pub summary: RunSummary,
    pub cancelled: bool,
}

impl RunReport {
    pub fn object_count(&self) -> usize {
        self.results.len()
    }
}
