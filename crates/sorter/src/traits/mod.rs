use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use image::RgbImage;

use crate::{
    error::{Result, SorterError},
    types::{DetectionResult, RunReport},
};

/// Decodes an image source into an 8-bit RGB pixel grid
pub trait ImageLoader {
    fn load(&self, source: &Path) -> Result<RgbImage>;
}

/// Persists what a run produces. Failures here are fatal to the run.
pub trait ResultSink {
    /// Write the annotated copy of `source`, returning where it went
    fn write_annotated(&mut self, source: &Path, image: &RgbImage) -> Result<PathBuf>;

    /// Append the run's records to the persistent log
    fn append_results(&mut self, results: &[DetectionResult]) -> Result<()>;
}

/// Progress notifications for reporters and review hooks.
/// Every method defaults to doing nothing.
pub trait RunObserver {
    fn images_found(&mut self, _count: usize) {}

    fn image_started(&mut self, _source: &Path) {}

    fn image_unreadable(&mut self, _source: &Path, _error: &SorterError) {}

    /// Called once the annotated copy of an image is complete. A review
    /// hook may block here; an error aborts the run.
    fn image_annotated(&mut self, _source: &Path, _annotated: &RgbImage) -> Result<()> {
        Ok(())
    }

    fn run_finished(&mut self, _report: &RunReport) {}
}

/// Observer that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl RunObserver for NoopObserver {}

/// Wall-clock source for result timestamps
pub trait Clock {
    fn now(&self) -> NaiveDateTime;
}

/// Local system time, truncated to whole seconds
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        use chrono::Timelike;
        let now = chrono::Local::now().naive_local();
        now.with_nanosecond(0).unwrap_or(now)
    }
}
