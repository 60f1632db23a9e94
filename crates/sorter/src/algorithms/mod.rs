pub mod hsv;
pub mod detection;
pub mod classification;
pub mod binning;

pub use hsv::{HsvImage, HsvRange};
pub use detection::*;
pub use classification::*;
pub use binning::*;
