//! Codepilot Extractor
//!
//! Classifies uploaded artifacts and turns them into bounded prompt payloads.
//!
//! # Overview
//!
//! Every upload is dispatched on its file extension (and declared media type)
//! to exactly one branch:
//!
//! ```text
//! source code  → lossy UTF-8 decode → truncate to budget → language tag
//! PDF          → text layer of first pages → (empty?) OCR of first pages → sentinel
//! image        → decode raster, keep encoded bytes for multimodal submission
//! anything else→ permissive decode of a byte prefix
//! ```
//!
//! Extraction never fails past its boundary: decode problems are downgraded
//! to a sentinel or an [`ExtractionResult::Unsupported`] placeholder, and all
//! payload text stays within the configured budgets. No network I/O happens
//! here; [`PromptBuilder`] turns the result into the text handed to a provider.
//!
//! # Example Usage
//!
//! ```
//! use codepilot_domain::UploadedArtifact;
//! use codepilot_extractor::{ArtifactExtractor, ExtractorConfig, PromptBuilder};
//!
//! let extractor = ArtifactExtractor::new(ExtractorConfig::default());
//! let artifact = UploadedArtifact::new("fib.py", b"def fib(n): ...".to_vec());
//!
//! let result = extractor.classify_and_extract(&artifact);
//! let prompt = PromptBuilder::new(artifact.name()).build(&result).unwrap();
//! assert!(prompt.text.starts_with("Explain this Python code:"));
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod extractor;
mod language;
mod ocr;
mod pdf;
mod prompt;
mod types;


pub use config::ExtractorConfig;
pub use error::ExtractorError;
pub use extractor::{classify, classify_and_extract, ArtifactExtractor};
pub use language::{is_source_extension, LanguageTag, SOURCE_EXTENSIONS};
#[cfg(feature = "ocr")]
pub use ocr::TesseractOcr;
pub use ocr::{default_ocr_engine, EmbeddedImageRasterizer, NoOcr, OcrEngine, PageRasterizer};
pub use prompt::{Prompt, PromptBuilder};
pub use types::{ArtifactCategory, DecodedImage, ExtractionResult, TextSource, NO_READABLE_TEXT};
