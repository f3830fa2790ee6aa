//! Core classification and extraction

use crate::config::ExtractorConfig;
use crate::error::ExtractorError;
use crate::language::{is_source_extension, LanguageTag};
use crate::ocr::{default_ocr_engine, EmbeddedImageRasterizer, OcrEngine, PageRasterizer};
use crate::pdf::{guarded, read_text_layer};
use crate::types::{
    truncate_chars, ArtifactCategory, DecodedImage, ExtractionResult, TextSource, NO_READABLE_TEXT,
};
use codepilot_domain::UploadedArtifact;
use tracing::{debug, info, warn};

/// Image extensions recognized without a declared media type
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif", "webp", "bmp"];

/// Decide the content category of an artifact
///
/// First match wins: source-code extension, then PDF, then image, then unknown.
pub fn classify(artifact: &UploadedArtifact) -> ArtifactCategory {
    let extension = artifact.extension();
    let extension = extension.as_deref();
    let media_type = artifact
        .declared_media_type()
        .map(|m| m.trim().to_ascii_lowercase());
    let media_type = media_type.as_deref();

    if extension.is_some_and(is_source_extension) {
        ArtifactCategory::SourceCode
    } else if extension == Some("pdf") || media_type == Some("application/pdf") {
        ArtifactCategory::Pdf
    } else if extension.is_some_and(|e| IMAGE_EXTENSIONS.contains(&e))
        || media_type.is_some_and(|m| m.starts_with("image/"))
    {
        ArtifactCategory::Image
    } else {
        ArtifactCategory::Unknown
    }
}

/// Classify and extract with the default configuration
///
/// # Examples
///
/// ```
/// use codepilot_domain::UploadedArtifact;
/// use codepilot_extractor::{classify_and_extract, ExtractionResult};
///
/// let artifact = UploadedArtifact::new("hello.py", b"print('hi')".to_vec());
/// match classify_and_extract(&artifact) {
///     ExtractionResult::SourceCode { language, text, truncated } => {
///         assert_eq!(language.tag(), "python");
///         assert_eq!(text, "print('hi')");
///         assert!(!truncated);
///     }
///     other => panic!("unexpected result: {:?}", other),
/// }
/// ```
pub fn classify_and_extract(artifact: &UploadedArtifact) -> ExtractionResult {
    ArtifactExtractor::default().classify_and_extract(artifact)
}

/// Turns uploaded artifacts into bounded prompt payloads
pub struct ArtifactExtractor {
    config: ExtractorConfig,
    rasterizer: Box<dyn PageRasterizer>,
    ocr: Box<dyn OcrEngine>,
}

impl ArtifactExtractor {
    /// Create an extractor with the default rasterizer and OCR engine
    pub fn new(config: ExtractorConfig) -> Self {
        Self {
            config,
            rasterizer: Box::new(EmbeddedImageRasterizer),
            ocr: default_ocr_engine(),
        }
    }

    /// Replace the OCR engine
    pub fn with_ocr_engine(mut self, ocr: impl OcrEngine + 'static) -> Self {
        self.ocr = Box::new(ocr);
        self
    }

    /// Replace the page rasterizer
    pub fn with_rasterizer(mut self, rasterizer: impl PageRasterizer + 'static) -> Self {
        self.rasterizer = Box::new(rasterizer);
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ExtractorConfig {
        &self.config
    }

    /// Classify the artifact and produce a payload for it
    ///
    /// Never fails: decode problems become a sentinel or an
    /// [`ExtractionResult::Unsupported`] placeholder.
    pub fn classify_and_extract(&self, artifact: &UploadedArtifact) -> ExtractionResult {
        let category = classify(artifact);
        info!(
            name = artifact.name(),
            bytes = artifact.len(),
            category = category.as_str(),
            "Extracting artifact"
        );

        match self.try_extract(artifact, category) {
            Ok(result) => result,
            Err(e) => {
                warn!(name = artifact.name(), error = %e, "Extraction degraded to placeholder");
                ExtractionResult::Unsupported {
                    reason: format!("{} could not be processed ({})", artifact.name(), e),
                }
            }
        }
    }

    fn try_extract(
        &self,
        artifact: &UploadedArtifact,
        category: ArtifactCategory,
    ) -> Result<ExtractionResult, ExtractorError> {
        let extension = artifact.extension();
        if !self.config.accepts(extension.as_deref()) {
            return Err(ExtractorError::Unsupported(format!(
                "files of type '{}' are not accepted",
                extension.as_deref().unwrap_or("(none)")
            )));
        }

        match category {
            ArtifactCategory::SourceCode => Ok(self.extract_source(artifact)),
            ArtifactCategory::Pdf => Ok(self.extract_pdf(artifact)),
            ArtifactCategory::Image => self.extract_image(artifact),
            ArtifactCategory::Unknown => Ok(self.extract_preview(artifact)),
        }
    }

    fn extract_source(&self, artifact: &UploadedArtifact) -> ExtractionResult {
        let decoded = String::from_utf8_lossy(artifact.bytes());
        let (text, truncated) = truncate_chars(&decoded, self.config.max_source_chars);
        let language = artifact
            .extension()
            .map(|e| LanguageTag::for_extension(&e))
            .unwrap_or(LanguageTag::UNKNOWN);

        debug!(chars = text.chars().count(), truncated, "Decoded source code");

        ExtractionResult::SourceCode {
            language,
            text,
            truncated,
        }
    }

    fn extract_pdf(&self, artifact: &UploadedArtifact) -> ExtractionResult {
        let bytes = artifact.bytes();
        let pages = self.config.pdf_text_pages;
        let text_layer = match guarded(|| read_text_layer(bytes, pages), ExtractorError::Pdf) {
            Ok(text) => text,
            Err(e) => {
                warn!(name = artifact.name(), error = %e, "PDF text layer unreadable");
                String::new()
            }
        };

        if !text_layer.trim().is_empty() {
            return self.document(&text_layer, TextSource::TextLayer);
        }

        info!(name = artifact.name(), "PDF has no text layer, falling back to OCR");
        match guarded(|| self.run_ocr(bytes), ExtractorError::Ocr) {
            Ok(text) if !text.trim().is_empty() => self.document(&text, TextSource::Ocr),
            Ok(_) => self.no_readable_text(),
            Err(e) => {
                warn!(name = artifact.name(), error = %e, "OCR fallback failed");
                self.no_readable_text()
            }
        }
    }

    fn run_ocr(&self, bytes: &[u8]) -> Result<String, ExtractorError> {
        let pages = self
            .rasterizer
            .rasterize(bytes, self.config.ocr_pages)
            .map_err(|e| ExtractorError::Ocr(format!("{:#}", e)))?;

        debug!(images = pages.len(), "Running OCR over rasterized pages");

        let mut recognized = Vec::with_capacity(pages.len());
        for (idx, page) in pages.iter().enumerate() {
            match self.ocr.recognize(page) {
                Ok(text) => recognized.push(text),
                Err(e) => {
                    let detail = format!("{:#}", e);
                    warn!(image = idx, error = %detail, "OCR failed for page image");
                }
            }
        }

        Ok(recognized.join("\n"))
    }

    fn document(&self, text: &str, source: TextSource) -> ExtractionResult {
        let (text, truncated) = truncate_chars(text.trim(), self.config.max_document_chars);
        ExtractionResult::Document {
            text,
            truncated,
            source,
        }
    }

    fn no_readable_text(&self) -> ExtractionResult {
        ExtractionResult::Document {
            text: NO_READABLE_TEXT.to_string(),
            truncated: false,
            source: TextSource::None,
        }
    }

    fn extract_image(&self, artifact: &UploadedArtifact) -> Result<ExtractionResult, ExtractorError> {
        let format = image::guess_format(artifact.bytes())?;
        let decoded = image::load_from_memory_with_format(artifact.bytes(), format)?;

        debug!(
            width = decoded.width(),
            height = decoded.height(),
            "Decoded image"
        );

        Ok(ExtractionResult::Image(DecodedImage {
            image: decoded,
            media_type: format.to_mime_type().to_string(),
            encoded: artifact.bytes().to_vec(),
        }))
    }

    fn extract_preview(&self, artifact: &UploadedArtifact) -> ExtractionResult {
        let bytes = artifact.bytes();
        let end = bytes.len().min(self.config.preview_bytes);
        let text = String::from_utf8_lossy(&bytes[..end]).into_owned();

        ExtractionResult::Preview {
            text,
            truncated: bytes.len() > end,
        }
    }
}

impl Default for ArtifactExtractor {
    fn default() -> Self {
        Self::new(ExtractorConfig::default())
    }
}

impl std::fmt::Debug for ArtifactExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactExtractor")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str, bytes: &[u8]) -> UploadedArtifact {
        UploadedArtifact::new(name, bytes.to_vec())
    }

    #[test]
    fn test_classify_order() {
        assert_eq!(classify(&artifact("a.py", b"")), ArtifactCategory::SourceCode);
        assert_eq!(classify(&artifact("a.PDF", b"")), ArtifactCategory::Pdf);
        assert_eq!(classify(&artifact("a.jpeg", b"")), ArtifactCategory::Image);
        assert_eq!(classify(&artifact("a.zip", b"")), ArtifactCategory::Unknown);
        assert_eq!(classify(&artifact("README", b"")), ArtifactCategory::Unknown);
    }

    #[test]
    fn test_classify_by_media_type() {
        let pdf = artifact("upload", b"").with_media_type("application/pdf");
        assert_eq!(classify(&pdf), ArtifactCategory::Pdf);

        let png = artifact("upload.bin", b"").with_media_type("Image/PNG");
        assert_eq!(classify(&png), ArtifactCategory::Image);
    }

    #[test]
    fn test_source_extension_wins_over_media_type() {
        let js = artifact("app.js", b"").with_media_type("image/png");
        assert_eq!(classify(&js), ArtifactCategory::SourceCode);
    }

    #[test]
    fn test_source_replaces_invalid_utf8() {
        let result = classify_and_extract(&artifact("bad.c", b"int x;\xff\xfe"));
        match result {
            ExtractionResult::SourceCode { text, language, .. } => {
                assert!(text.starts_with("int x;"));
                assert!(text.contains('\u{FFFD}'));
                assert_eq!(language.tag(), "c");
            }
            other => panic!("expected source code, got {:?}", other),
        }
    }

    #[test]
    fn test_source_truncated_to_budget() {
        let body = "x".repeat(10_000);
        let result = classify_and_extract(&artifact("big.py", body.as_bytes()));
        assert_eq!(result.text().unwrap().chars().count(), 4000);
        assert!(result.is_truncated());
    }

    #[test]
    fn test_unmapped_source_has_empty_tag() {
        match classify_and_extract(&artifact("defs.h", b"#define X 1")) {
            ExtractionResult::SourceCode { language, .. } => assert!(language.is_unknown()),
            other => panic!("expected source code, got {:?}", other),
        }
    }

    #[test]
    fn test_preview_bounded_to_prefix() {
        let bytes: Vec<u8> = (0..5000u32).map(|i| b'a' + (i % 26) as u8).collect();
        let result = classify_and_extract(&artifact("data.bin", &bytes));
        match result {
            ExtractionResult::Preview { text, truncated } => {
                assert_eq!(text.len(), 2000);
                assert!(truncated);
            }
            other => panic!("expected preview, got {:?}", other),
        }
    }

    #[test]
    fn test_small_preview_not_truncated() {
        let result = classify_and_extract(&artifact("notes.txt", b"hello"));
        assert_eq!(result.text(), Some("hello"));
        assert!(!result.is_truncated());
    }

    #[test]
    fn test_undecodable_image_is_unsupported() {
        let result = classify_and_extract(&artifact("photo.png", b"not an image"));
        match result {
            ExtractionResult::Unsupported { reason } => assert!(reason.contains("photo.png")),
            other => panic!("expected unsupported, got {:?}", other),
        }
    }

    #[test]
    fn test_allow_list_rejects_other_types() {
        let extractor =
            ArtifactExtractor::new(ExtractorConfig::default().with_allowed_extensions(["py"]));
        assert!(extractor
            .classify_and_extract(&artifact("main.rs", b"fn main() {}"))
            .is_unsupported());
        assert!(!extractor
            .classify_and_extract(&artifact("main.py", b"pass"))
            .is_unsupported());
    }
}
