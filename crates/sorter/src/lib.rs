//! # Colour Sorting Pipeline
//!
//! Batch vision pipeline for a colour sorter: finds candidate objects in
//! still images by HSV colour segmentation, classifies each object by the
//! mean hue of its pixels, routes the category to a sorting bin and
//! records the outcome.
//!
//! ## Stages
//!
//! - [`RegionDetector`]: HSV conversion, 5x5 blur, blue-range mask,
//!   external contours, minimum-area filter
//! - [`ColorClassifier`]: mean HSV of the original pixels, ordered hue table
//! - [`BinMapper`]: category → bin lookup
//! - [`PipelineRunner`]: runs the stages per image, numbers the objects,
//!   draws annotations and hands everything to a [`ResultSink`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use sorter::{discover_images, FileSink, NoopObserver, PipelineRunner};
//!
//! let sources = discover_images(Path::new("images"), &["jpg"])?;
//! let mut runner = PipelineRunner::builder()
//!     .with_sink(FileSink::create("outputs", "results.csv")?)
//!     .build()?;
//!
//! let report = runner.run(&sources, &mut NoopObserver)?;
//! for (bin, count) in report.summary.iter() {
//!     println!("{bin}: {count} objects");
//! }
//! # Ok::<(), sorter::SorterError>(())
//! ```

pub mod error;
pub mod types;
pub mod traits;
pub mod algorithms;
pub mod pipeline;
pub mod io;

pub use error::{Result, SorterError};
pub use types::*;
pub use traits::*;
pub use algorithms::{BinMapper, ColorClassifier, RegionDetector};
pub use pipeline::{annotate::Annotator, builder::PipelineBuilder, PipelineRunner, RunState};
pub use io::*;
