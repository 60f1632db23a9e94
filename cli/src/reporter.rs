use std::fmt;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use image::RgbImage;
use sorter::{RunObserver, RunReport, SorterError};
use tracing::warn;

/// Human-readable progress on a terminal, with an optional pause after
/// each annotated image for manual review.
pub struct ConsoleReporter<W, R> {
    out: W,
    input: R,
    review: bool,
    log_path: PathBuf,
}

impl<W: Write, R: BufRead> ConsoleReporter<W, R> {
    pub fn new(out: W, input: R, log_path: PathBuf) -> Self {
        Self {
            out,
            input,
            review: false,
            log_path,
        }
    }

    pub fn with_review(mut self, review: bool) -> Self {
        self.review = review;
        self
    }

    pub fn into_output(self) -> W {
        self.out
    }

    fn line(&mut self, args: fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{args}") {
            warn!(error = %e, "Failed to write console output");
        }
    }
}

/// Closing log line for a run, distinguishing interrupted runs
pub fn completion_message(report: &RunReport) -> String {
    if report.cancelled {
        format!(
            "⚠️ Sorting interrupted after {} of {} images",
            images_attempted(report),
            report.images_found
        )
    } else {
        "✅ Sorting completed!".to_string()
    }
}

fn images_attempted(report: &RunReport) -> usize {
    report.images_processed + report.images_failed.len()
}

fn display_name(source: &Path) -> String {
    source
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| source.display().to_string())
}

impl<W: Write, R: BufRead> RunObserver for ConsoleReporter<W, R> {
    fn images_found(&mut self, count: usize) {
        self.line(format_args!("Found {count} images"));
    }

    fn image_started(&mut self, source: &Path) {
        let name = display_name(source);
        self.line(format_args!("\nProcessing: {name}"));
    }

    fn image_unreadable(&mut self, _source: &Path, _error: &SorterError) {
        self.line(format_args!("Image not readable"));
    }

    fn image_annotated(&mut self, source: &Path, _annotated: &RgbImage) -> sorter::Result<()> {
        if !self.review {
            return Ok(());
        }
        let name = display_name(source);
        self.line(format_args!("Review {name}, press Enter to continue"));
        self.out.flush()?;
        let mut answer = String::new();
        self.input.read_line(&mut answer)?;
        Ok(())
    }

    fn run_finished(&mut self, report: &RunReport) {
        if report.cancelled {
            self.line(format_args!(
                "\nInterrupted after {} of {} images",
                images_attempted(report),
                report.images_found
            ));
        }
        let log = self.log_path.display().to_string();
        self.line(format_args!("\nSaved {} objects to {log}", report.object_count()));
        self.line(format_args!("\n--- SUMMARY ---"));
        for (bin, count) in report.summary.iter() {
            self.line(format_args!("{bin}: {count} objects"));
        }
    }
}
