//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and infrastructure.
//! Implementations live in other crates.

use crate::{ConversationTurn, ImageAttachment};
use std::future::Future;

/// A single request to a model provider
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRequest {
    /// Conversation so far, oldest first; the last user turn is the question
    pub messages: Vec<ConversationTurn>,

    /// Image to send alongside the last user turn (multimodal providers)
    pub image: Option<ImageAttachment>,
}

impl ChatRequest {
    /// Build a request from a slice of turns
    pub fn new(messages: &[ConversationTurn]) -> Self {
        Self {
            messages: messages.to_vec(),
            image: None,
        }
    }

    /// Attach an image to the request
    pub fn with_image(mut self, image: ImageAttachment) -> Self {
        self.image = Some(image);
        self
    }
}

/// Trait for model provider operations
///
/// Implemented by the infrastructure layer (codepilot-llm)
pub trait ChatProvider {
    /// Error type for provider operations
    type Error: std::fmt::Display;

    /// Short human-readable provider name, used in logs
    fn name(&self) -> &str;

    /// Submit the request and return the generated text
    fn complete(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}
