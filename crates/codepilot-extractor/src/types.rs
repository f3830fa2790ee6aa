//! Classification categories and extraction results

use crate::language::LanguageTag;
use codepilot_domain::ImageAttachment;
use image::DynamicImage;

/// Text shown to the model when a PDF yields nothing readable
pub const NO_READABLE_TEXT: &str = "[no readable text found in document]";

/// Content category decided from the file name and declared media type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactCategory {
    /// Recognized source-code extension
    SourceCode,
    /// PDF document
    Pdf,
    /// Raster image
    Image,
    /// Anything else; previewed as text
    Unknown,
}

impl ArtifactCategory {
    /// Lowercase name for display
    pub fn as_str(&self) -> &'static str {
        match self {
            ArtifactCategory::SourceCode => "source",
            ArtifactCategory::Pdf => "pdf",
            ArtifactCategory::Image => "image",
            ArtifactCategory::Unknown => "unknown",
        }
    }
}

/// Where a document's text came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSource {
    /// Embedded text layer
    TextLayer,
    /// Optical character recognition over rendered pages
    Ocr,
    /// Neither path produced text; the payload is [`NO_READABLE_TEXT`]
    None,
}

/// A decoded raster, held for multimodal submission
#[derive(Debug, Clone)]
pub struct DecodedImage {
    /// Decoded pixels
    pub image: DynamicImage,

    /// MIME type of the original bytes
    pub media_type: String,

    /// Original encoded bytes, sent as-is
    pub encoded: Vec<u8>,
}

impl DecodedImage {
    /// Width and height in pixels
    pub fn dimensions(&self) -> (u32, u32) {
        (self.image.width(), self.image.height())
    }

    /// Encoded payload for a provider request
    pub fn to_attachment(&self) -> ImageAttachment {
        ImageAttachment::new(self.media_type.clone(), self.encoded.clone())
    }
}

/// The outcome of classifying and extracting one artifact
#[derive(Debug, Clone)]
pub enum ExtractionResult {
    /// Decoded, truncated source code
    SourceCode {
        /// Language label; empty when the extension is unmapped
        language: LanguageTag,
        /// Decoded text, within the source budget
        text: String,
        /// Whether the text was cut to fit the budget
        truncated: bool,
    },

    /// Text pulled from a document
    Document {
        /// Extracted text or the no-readable-text sentinel
        text: String,
        /// Whether the text was cut to fit the budget
        truncated: bool,
        /// Which path produced the text
        source: TextSource,
    },

    /// A decoded image; no text is extracted
    Image(DecodedImage),

    /// Permissively decoded prefix of an unknown binary
    Preview {
        /// Decoded prefix
        text: String,
        /// Whether the artifact was longer than the preview
        truncated: bool,
    },

    /// Nothing usable could be produced; the reason is shown to the user
    Unsupported {
        /// Explanation for the user
        reason: String,
    },
}

impl ExtractionResult {
    /// Short label for the result kind
    pub fn kind(&self) -> &'static str {
        match self {
            ExtractionResult::SourceCode { .. } => "source",
            ExtractionResult::Document { .. } => "document",
            ExtractionResult::Image(_) => "image",
            ExtractionResult::Preview { .. } => "preview",
            ExtractionResult::Unsupported { .. } => "unsupported",
        }
    }

    /// Text payload, if the result carries one
    pub fn text(&self) -> Option<&str> {
        match self {
            ExtractionResult::SourceCode { text, .. }
            | ExtractionResult::Document { text, .. }
            | ExtractionResult::Preview { text, .. } => Some(text),
            ExtractionResult::Image(_) | ExtractionResult::Unsupported { .. } => None,
        }
    }

    /// Whether the payload was truncated to fit its budget
    pub fn is_truncated(&self) -> bool {
        match self {
            ExtractionResult::SourceCode { truncated, .. }
            | ExtractionResult::Document { truncated, .. }
            | ExtractionResult::Preview { truncated, .. } => *truncated,
            ExtractionResult::Image(_) | ExtractionResult::Unsupported { .. } => false,
        }
    }

    /// Whether the result is the unsupported placeholder
    pub fn is_unsupported(&self) -> bool {
        matches!(self, ExtractionResult::Unsupported { .. })
    }
}

/// Keep at most `max_chars` characters, reporting whether anything was cut
pub(crate) fn truncate_chars(text: &str, max_chars: usize) -> (String, bool) {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => (text[..byte_idx].to_string(), true),
        None => (text.to_string(), false),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_short_text() {
        assert_eq!(truncate_chars("abc", 5), ("abc".to_string(), false));
        assert_eq!(truncate_chars("abc", 3), ("abc".to_string(), false));
    }

    #[test]
    fn test_truncate_chars_counts_characters_not_bytes() {
        let (text, truncated) = truncate_chars("héllo wörld", 4);
        assert_eq!(text, "héll");
        assert!(truncated);
        assert_eq!(text.chars().count(), 4);
    }

    #[test]
    fn test_result_accessors() {
        let result = ExtractionResult::Preview {
            text: "abc".to_string(),
            truncated: true,
        };
        assert_eq!(result.kind(), "preview");
        assert_eq!(result.text(), Some("abc"));
        assert!(result.is_truncated());

        let result = ExtractionResult::Unsupported {
            reason: "nope".to_string(),
        };
        assert!(result.is_unsupported());
        assert_eq!(result.text(), None);
    }
}
