use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};

use image::RgbImage;
use serde::Serialize;
use tracing::info;

use crate::{
    error::{Result, SorterError},
    traits::ResultSink,
    types::DetectionResult,
};

/// Column names of the result log
pub const LOG_HEADER: [&str; 5] = ["timestamp", "object_id", "color", "bin", "area"];

#[derive(Debug, Serialize)]
struct LogRow {
    timestamp: String,
    object_id: u64,
    color: &'static str,
    bin: &'static str,
    area: u32,
}

impl From<&DetectionResult> for LogRow {
    fn from(result: &DetectionResult) -> Self {
        Self {
            timestamp: result.formatted_timestamp(),
            object_id: result.object_id,
            color: result.color.into(),
            bin: result.bin.into(),
            area: result.area,
        }
    }
}

/// `{stem}_annotated.{ext}` for a source path; the extension is lower-cased
/// and defaults to `jpg` when the source has none.
pub fn annotated_file_name(source: &Path) -> Result<String> {
    let stem = source
        .file_stem()
        .and_then(|stem| stem.to_str())
        .ok_or_else(|| SorterError::InvalidSource(source.to_path_buf()))?;
    let extension = source
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_else(|| "jpg".to_string());
    Ok(format!("{stem}_annotated.{extension}"))
}

/// Writes annotated images into an output directory and appends results
/// to a CSV log.
#[derive(Debug, Clone)]
pub struct FileSink {
    output_dir: PathBuf,
    log_path: PathBuf,
}

impl FileSink {
    /// Creates `output_dir` if needed. A relative `log_path` is resolved
    /// against `output_dir`.
    pub fn create<P: AsRef<Path>, L: AsRef<Path>>(output_dir: P, log_path: L) -> Result<Self> {
        let output_dir = output_dir.as_ref().to_path_buf();
        fs::create_dir_all(&output_dir)?;
        let log_path = if log_path.as_ref().is_absolute() {
            log_path.as_ref().to_path_buf()
        } else {
            output_dir.join(log_path)
        };
        Ok(Self { output_dir, log_path })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }
}

impl ResultSink for FileSink {
    fn write_annotated(&mut self, source: &Path, image: &RgbImage) -> Result<PathBuf> {
        let destination = self.output_dir.join(annotated_file_name(source)?);
        image
            .save(&destination)
            .map_err(|e| SorterError::Sink(format!("{}: {e}", destination.display())))?;
        Ok(destination)
    }

    fn append_results(&mut self, results: &[DetectionResult]) -> Result<()> {
        let existed = self.log_path.exists();
        let file = OpenOptions::new().create(true).append(true).open(&self.log_path)?;
        let mut writer = csv::WriterBuilder::new().has_headers(false).from_writer(file);

        if !existed {
            writer.write_record(LOG_HEADER)?;
        }
        for result in results {
            writer.serialize(LogRow::from(result))?;
        }
        writer.flush()?;

        info!(rows = results.len(), log = %self.log_path.display(), "Appended results");
        Ok(())
    }
}
