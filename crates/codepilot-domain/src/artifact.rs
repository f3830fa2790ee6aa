//! Uploaded artifacts
//!
//! An artifact is created once per upload event, handed to the extractor and
//! then dropped. Nothing about it is persisted.

use std::fs;
use std::io;
use std::path::Path;

/// A user-uploaded file blob prior to classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedArtifact {
    name: String,
    bytes: Vec<u8>,
    declared_media_type: Option<String>,
}

impl UploadedArtifact {
    /// Create a new artifact
    ///
    /// # Examples
    ///
    /// ```
    /// use codepilot_domain::UploadedArtifact;
    ///
    /// let artifact = UploadedArtifact::new("main.PY", b"print('hi')".to_vec());
    /// assert_eq!(artifact.extension().as_deref(), Some("py"));
    /// ```
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
            declared_media_type: None,
        }
    }

    /// Attach the media type reported by the upload source
    pub fn with_media_type(mut self, media_type: impl Into<String>) -> Self {
        self.declared_media_type = Some(media_type.into());
        self
    }

    /// Read an artifact from disk, naming it after the file name component
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self::new(name, bytes))
    }

    /// File name as uploaded
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Raw uploaded bytes
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Media type declared by the upload source, if any
    pub fn declared_media_type(&self) -> Option<&str> {
        self.declared_media_type.as_deref()
    }

    /// Lowercase extension of the file name, without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.name)
            .extension()
            .and_then(|e| e.to_str())
            .filter(|e| !e.is_empty())
            .map(|e| e.to_lowercase())
    }

    /// Size of the upload in bytes
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether the upload carried no bytes
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}
