use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SorterError {
    #[error("Failed to load image: {0}")]
    ImageLoad(#[from] image::ImageError),

    #[error("Not a readable image source: {}", .0.display())]
    InvalidSource(PathBuf),

    #[error("Failed to load label font: {0}")]
    Font(String),

    #[error("Result sink error: {0}")]
    Sink(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SorterError>;
