//! Extract command implementation.

use crate::cli::ExtractArgs;
use crate::config::Config;
use crate::error::Result;
use crate::output::Formatter;
use codepilot_domain::UploadedArtifact;
use codepilot_extractor::{ArtifactExtractor, ExtractionResult};

/// Execute the extract command. Never touches the network.
pub fn execute_extract(
    args: ExtractArgs,
    config: &Config,
    formatter: &Formatter,
) -> Result<ExtractionResult> {
    let mut artifact = UploadedArtifact::from_path(&args.path)?;
    if let Some(media_type) = args.media_type {
        artifact = artifact.with_media_type(media_type);
    }

    let extractor = ArtifactExtractor::new(config.extraction.clone());
    let result = extractor.classify_and_extract(&artifact);

    println!("{}", formatter.format_extraction(artifact.name(), &result)?);
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use std::fs;

    #[test]
    fn test_extract_uses_configured_budget() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("long.py");
        fs::write(&path, "x = 1\n".repeat(100)).unwrap();

        let mut config = Config::default();
        config.extraction.max_source_chars = 10;
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        let result = execute_extract(
            ExtractArgs {
                path,
                media_type: None,
            },
            &config,
            &formatter,
        )
        .unwrap();

        assert_eq!(result.kind(), "source");
        assert!(result.is_truncated());
        assert_eq!(result.text().unwrap().chars().count(), 10);
    }

    #[test]
    fn test_extract_honors_declared_media_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upload.bin");
        fs::write(&path, b"not really a pdf").unwrap();

        let formatter = Formatter::new(OutputFormat::Quiet, false);
        let result = execute_extract(
            ExtractArgs {
                path,
                media_type: Some("application/pdf".to_string()),
            },
            &Config::default(),
            &formatter,
        )
        .unwrap();

        assert_eq!(result.kind(), "document");
        assert_eq!(result.text(), Some(codepilot_extractor::NO_READABLE_TEXT));
    }
}
