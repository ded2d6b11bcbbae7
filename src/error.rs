//! Error handling for poster generation

use std::io;
use thiserror::Error;

/// Result type for poster generation operations
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for poster generation
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid crop, output size, or page geometry, or a transform that is
    /// no longer a pure translate + scale
    #[error("Invalid geometry: {0}")]
    Geometry(String),
    /// The output surface could not be opened or advanced to a new page
    #[error("Surface error: {0}")]
    Surface(String),
    /// Raster allocation kept failing until the resolution collapsed
    #[error("Allocation failed: {0}")]
    Allocation(String),
    /// The page source is not a format the requested path can consume
    #[error("Source format error: {0}")]
    SourceFormat(String),
    /// No conversion factor exists between the two units
    #[error("Invalid unit conversion: {0} to {1}")]
    UnitConversion(&'static str, &'static str),
    #[error("System error: {0}")]
    Io(#[from] io::Error),
    #[error("PDF error: {0}")]
    Pdf(#[from] lopdf::Error),
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

impl Error {
    pub fn geometry<S: Into<String>>(msg: S) -> Self {
        Error::Geometry(msg.into())
    }

    pub fn surface<S: Into<String>>(msg: S) -> Self {
        Error::Surface(msg.into())
    }

    pub fn allocation<S: Into<String>>(msg: S) -> Self {
        Error::Allocation(msg.into())
    }

    pub fn source_format<S: Into<String>>(msg: S) -> Self {
        Error::SourceFormat(msg.into())
    }
}
