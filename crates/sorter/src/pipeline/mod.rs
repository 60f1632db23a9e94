pub mod annotate;
pub mod builder;

use std::path::{Path, PathBuf};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use chrono::NaiveDateTime;
use image::RgbImage;
use tracing::{debug, error, info, warn};

use crate::{
    algorithms::{BinMapper, ColorClassifier, RegionDetector},
    error::Result,
    traits::{Clock, ImageLoader, ResultSink, RunObserver},
    types::{BinId, ColorCategory, DetectionResult, Region, RunReport, RunSummary},
};
use annotate::Annotator;

/// Mutable state of one run: the object-id counter and the results so far.
#[derive(Debug, Clone)]
pub struct RunState {
    next_object_id: u64,
    results: Vec<DetectionResult>,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            next_object_id: 1,
            results: Vec::new(),
        }
    }

    pub fn next_object_id(&self) -> u64 {
        self.next_object_id
    }

    pub fn results(&self) -> &[DetectionResult] {
        &self.results
    }

    pub fn into_results(self) -> Vec<DetectionResult> {
        self.results
    }

    /// Assign the next id and store the record
    pub fn record(
        &mut self,
        timestamp: NaiveDateTime,
        color: ColorCategory,
        bin: BinId,
        region: Region,
        source: &Path,
    ) -> &DetectionResult {
        let object_id = self.next_object_id;
        self.next_object_id += 1;
        self.results.push(DetectionResult {
            timestamp,
            object_id,
            color,
            bin,
            area: region.area,
            region,
            source: source.to_path_buf(),
        });
        &self.results[self.results.len() - 1]
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}

/// Sequential detect → classify → bin → record pipeline over a list of
/// image sources.
pub struct PipelineRunner {
    loader: Box<dyn ImageLoader>,
    sink: Box<dyn ResultSink>,
    clock: Box<dyn Clock>,
    detector: RegionDetector,
    classifier: ColorClassifier,
    mapper: BinMapper,
    annotator: Annotator,
    cancel: Option<Arc<AtomicBool>>,
}

impl PipelineRunner {
    pub fn builder() -> builder::PipelineBuilder {
        builder::PipelineBuilder::new()
    }

    #[allow(clippy::too_many_arguments)]
    pub fn new(
        loader: Box<dyn ImageLoader>,
        sink: Box<dyn ResultSink>,
        clock: Box<dyn Clock>,
        detector: RegionDetector,
        classifier: ColorClassifier,
        mapper: BinMapper,
        annotator: Annotator,
        cancel: Option<Arc<AtomicBool>>,
    ) -> Self {
        Self {
            loader,
            sink,
            clock,
            detector,
            classifier,
            mapper,
            annotator,
            cancel,
        }
    }

    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::SeqCst))
    }

    /// Process `sources` in order, then flush every result to the sink.
    ///
    /// Unreadable images are skipped. A failed annotated write or review
    /// hook stops the run: the results gathered so far are flushed and the
    /// error is returned. If the cancel flag is raised, images not yet
    /// started are skipped and the gathered results are still flushed.
    pub fn run(&mut self, sources: &[PathBuf], observer: &mut dyn RunObserver) -> Result<RunReport> {
        info!(count = sources.len(), "Found images");
        observer.images_found(sources.len());

        let mut state = RunState::new();
        let mut images_processed = 0;
        let mut images_failed = Vec::new();
        let mut annotated_outputs = Vec::new();
        let mut cancelled = false;
        let mut failure = None;

        for source in sources {
            if self.is_cancelled() {
                warn!(remaining = sources.len() - images_processed - images_failed.len(), "Run cancelled");
                cancelled = true;
                break;
            }

            observer.image_started(source);
            info!(source = %source.display(), "Processing image");

            let image = match self.loader.load(source) {
                Ok(image) => image,
                Err(e) => {
                    warn!(source = %source.display(), error = %e, "Image not readable");
                    observer.image_unreadable(source, &e);
                    images_failed.push(source.clone());
                    continue;
                }
            };

            let annotated = self.process_image(&mut state, source, &image);
            let destination = match self.sink.write_annotated(source, &annotated) {
                Ok(destination) => destination,
                Err(e) => {
                    error!(source = %source.display(), error = %e, "Failed to write annotated image");
                    failure = Some(e);
                    break;
                }
            };
            debug!(destination = %destination.display(), "Wrote annotated image");
            annotated_outputs.push(destination);
            images_processed += 1;

            if let Err(e) = observer.image_annotated(source, &annotated) {
                error!(source = %source.display(), error = %e, "Review hook failed, stopping run");
                failure = Some(e);
                break;
            }
        }

        let flushed = self.sink.append_results(state.results());
        if let Some(e) = failure {
            if let Err(flush_error) = flushed {
                error!(error = %flush_error, "Failed to flush results of the stopped run");
            }
            return Err(e);
        }
        flushed?;

        let results = state.into_results();
        let summary = RunSummary::from_results(&results);
        let report = RunReport {
            images_found: sources.len(),
            images_processed,
            images_failed,
            annotated_outputs,
            results,
            summary,
            cancelled,
        };
        info!(objects = report.object_count(), "Run finished");
        observer.run_finished(&report);
        Ok(report)
    }

    /// Detect, classify and record every region of one image; returns the
    /// annotated copy.
    pub fn process_image(&self, state: &mut RunState, source: &Path, image: &RgbImage) -> RgbImage {
        let regions = self.detector.detect(image);
        debug!(source = %source.display(), regions = regions.len(), "Detected regions");

        let mut annotated = image.clone();
        for region in regions {
            let color = self.classifier.classify(image, &region);
            let bin = self.mapper.map(color);
            let result = state.record(self.clock.now(), color, bin, region, source);
            debug!(object_id = result.object_id, %color, %bin, area = region.area, "Classified region");
            self.annotator.annotate(&mut annotated, &region, &result.label());
        }
        annotated
    }
}
