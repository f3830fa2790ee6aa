//! Image payloads sent alongside a prompt

/// An encoded image ready for multimodal submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    /// MIME type of `data`, e.g. `image/png`
    pub media_type: String,

    /// Encoded image bytes as uploaded
    pub data: Vec<u8>,
}

impl ImageAttachment {
    /// Create a new attachment
    pub fn new(media_type: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            data,
        }
    }

    /// Size of the encoded payload in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the payload is empty
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
