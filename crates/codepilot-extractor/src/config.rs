//! Configuration for the Extractor

use serde::{Deserialize, Serialize};

/// Budgets and limits applied while turning an artifact into a payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    /// Maximum characters of decoded source code kept for the prompt
    pub max_source_chars: usize,

    /// Maximum characters of document text kept for the prompt
    pub max_document_chars: usize,

    /// Leading bytes of an unknown binary shown as a preview
    pub preview_bytes: usize,

    /// PDF pages read through the text layer
    pub pdf_text_pages: usize,

    /// PDF pages rasterized for OCR when the text layer is empty
    pub ocr_pages: usize,

    /// Accepted upload extensions (lowercase, no dot); `None` accepts everything
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_extensions: Option<Vec<String>>,
}

impl ExtractorConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_source_chars == 0 {
            return Err("max_source_chars must be greater than 0".to_string());
        }
        if self.max_document_chars == 0 {
            return Err("max_document_chars must be greater than 0".to_string());
        }
        if self.preview_bytes == 0 {
            return Err("preview_bytes must be greater than 0".to_string());
        }
        if self.pdf_text_pages == 0 {
            return Err("pdf_text_pages must be greater than 0".to_string());
        }
        if self.ocr_pages == 0 {
            return Err("ocr_pages must be greater than 0".to_string());
        }
        if let Some(allowed) = &self.allowed_extensions {
            if allowed.is_empty() {
                return Err("allowed_extensions must not be an empty list".to_string());
            }
        }
        Ok(())
    }

    /// Restrict uploads to the given extensions
    pub fn with_allowed_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.allowed_extensions = Some(
            extensions
                .into_iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_lowercase())
                .collect(),
        );
        self
    }

    /// Whether an upload with this extension passes the allow-list
    pub fn accepts(&self, extension: Option<&str>) -> bool {
        match (&self.allowed_extensions, extension) {
            (None, _) => true,
            (Some(allowed), Some(ext)) => allowed.iter().any(|a| a == ext),
            (Some(_), None) => false,
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            max_source_chars: 4000,
            max_document_chars: 4000,
            preview_bytes: 2000,
            pdf_text_pages: 5,
            ocr_pages: 3,
            allowed_extensions: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ExtractorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_source_chars, 4000);
        assert_eq!(config.preview_bytes, 2000);
        assert_eq!(config.pdf_text_pages, 5);
        assert_eq!(config.ocr_pages, 3);
    }

    #[test]
    fn test_invalid_budgets() {
        let mut config = ExtractorConfig::default();
        config.max_source_chars = 0;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.preview_bytes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_ocr_pages_rejected() {
        let mut config = ExtractorConfig::default();
        config.ocr_pages = 0;
        assert_eq!(
            config.validate().unwrap_err(),
            "ocr_pages must be greater than 0"
        );
    }

    #[test]
    fn test_empty_allow_list_rejected() {
        let config = ExtractorConfig::default().with_allowed_extensions(Vec::<String>::new());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_allow_list_normalizes_and_filters() {
        let config = ExtractorConfig::default().with_allowed_extensions([".PY", "rs"]);
        assert!(config.accepts(Some("py")));
        assert!(config.accepts(Some("rs")));
        assert!(!config.accepts(Some("pdf")));
        assert!(!config.accepts(None));
        assert!(ExtractorConfig::default().accepts(None));
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = ExtractorConfig::from_toml("max_source_chars = 100\n").unwrap();
        assert_eq!(config.max_source_chars, 100);
        assert_eq!(config.ocr_pages, 3);
        assert!(config.allowed_extensions.is_none());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = ExtractorConfig::default().with_allowed_extensions(["py"]);
        let toml_str = config.to_toml().unwrap();
        let parsed = ExtractorConfig::from_toml(&toml_str).unwrap();
        assert_eq!(config, parsed);
    }
}
