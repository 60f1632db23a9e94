use std::sync::{atomic::AtomicBool, Arc};

use crate::{
    algorithms::{BinMapper, ColorClassifier, RegionDetector},
    error::{Result, SorterError},
    io::FsImageLoader,
    pipeline::{annotate::Annotator, PipelineRunner},
    traits::{Clock, ImageLoader, ResultSink, SystemClock},
};

/// Builder for [`PipelineRunner`]. Only the sink is mandatory; the loader
/// defaults to [`FsImageLoader`] and the clock to local system time.
pub struct PipelineBuilder {
    loader: Option<Box<dyn ImageLoader>>,
    sink: Option<Box<dyn ResultSink>>,
    clock: Option<Box<dyn Clock>>,
    detector: RegionDetector,
    annotator: Annotator,
    cancel: Option<Arc<AtomicBool>>,
}

impl PipelineBuilder {
    pub fn new() -> Self {
        Self {
            loader: None,
            sink: None,
            clock: None,
            detector: RegionDetector::default(),
            annotator: Annotator::default(),
            cancel: None,
        }
    }

    pub fn with_loader<L>(mut self, loader: L) -> Self
    where
        L: ImageLoader + 'static,
    {
        self.loader = Some(Box::new(loader));
        self
    }

    pub fn with_sink<S>(mut self, sink: S) -> Self
    where
        S: ResultSink + 'static,
    {
        self.sink = Some(Box::new(sink));
        self
    }

    pub fn with_clock<C>(mut self, clock: C) -> Self
    where
        C: Clock + 'static,
    {
        self.clock = Some(Box::new(clock));
        self
    }

    pub fn with_detector(mut self, detector: RegionDetector) -> Self {
        self.detector = detector;
        self
    }

    pub fn with_annotator(mut self, annotator: Annotator) -> Self {
        self.annotator = annotator;
        self
    }

    /// Raising the flag stops the run before the next image starts
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    pub fn build(self) -> Result<PipelineRunner> {
        let sink = self
            .sink
            .ok_or_else(|| SorterError::Config("no result sink configured".to_string()))?;
        let loader = self.loader.unwrap_or_else(|| Box::new(FsImageLoader));
        let clock = self.clock.unwrap_or_else(|| Box::new(SystemClock));

        Ok(PipelineRunner::new(
            loader,
            sink,
            clock,
            self.detector,
            ColorClassifier,
            BinMapper,
            self.annotator,
            self.cancel,
        ))
    }
}

impl Default for PipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}
