//! Error types for the Extractor
//!
//! These never escape [`crate::ArtifactExtractor::classify_and_extract`];
//! they are downgraded to placeholder results at that boundary.

use thiserror::Error;

/// Errors that can occur inside a single extraction step
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Bytes could not be interpreted as the assumed type
    #[error("Decode error: {0}")]
    Decode(String),

    /// The PDF could not be parsed or read
    #[error("PDF error: {0}")]
    Pdf(String),

    /// Page rasterization or recognition failed
    #[error("OCR error: {0}")]
    Ocr(String),

    /// No classification branch accepts the artifact
    #[error("Unsupported artifact: {0}")]
    Unsupported(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<lopdf::Error> for ExtractorError {
    fn from(e: lopdf::Error) -> Self {
        ExtractorError::Pdf(e.to_string())
    }
}

impl From<image::ImageError> for ExtractorError {
    fn from(e: image::ImageError) -> Self {
        ExtractorError::Decode(e.to_string())
    }
}
