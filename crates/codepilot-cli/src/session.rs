//! Chat session state: transcript, re-upload guard, extractor, provider.

use crate::config::DEFAULT_SYSTEM_PROMPT;
use codepilot_domain::{
    ChatProvider, ChatRequest, ConversationTurn, ImageAttachment, SessionId, Transcript,
    UploadedArtifact,
};
use codepilot_extractor::{ArtifactExtractor, ExtractionResult, PromptBuilder};
use std::collections::HashSet;
use tracing::{debug, info, warn};

/// What happened to an upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    /// A file with this name was already processed in this session
    AlreadyProcessed,
    /// The file could not be used; the warning turn was appended
    Rejected(ConversationTurn),
    /// The file was sent to the model; this is the reply turn
    Answered(ConversationTurn),
}

/// One conversation with a model provider.
///
/// All mutation goes through `&mut self`; a session is never shared.
pub struct ChatSession<P> {
    id: SessionId,
    transcript: Transcript,
    processed: HashSet<String>,
    extractor: ArtifactExtractor,
    provider: P,
}

impl<P: ChatProvider> ChatSession<P> {
    /// Start a session with the default preamble and extractor.
    pub fn new(provider: P) -> Self {
        Self {
            id: SessionId::new(),
            transcript: Transcript::new(Some(DEFAULT_SYSTEM_PROMPT.to_string())),
            processed: HashSet::new(),
            extractor: ArtifactExtractor::default(),
            provider,
        }
    }

    /// Replace the system preamble; blank disables it.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        let prompt = prompt.into();
        let preamble = (!prompt.trim().is_empty()).then_some(prompt);
        self.transcript = Transcript::new(preamble);
        self
    }

    /// Replace the extractor used for uploads.
    pub fn with_extractor(mut self, extractor: ArtifactExtractor) -> Self {
        self.extractor = extractor;
        self
    }

    /// Session identifier.
    pub fn id(&self) -> SessionId {
        self.id
    }

    /// Full transcript, preamble included.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// The provider this session talks to.
    pub fn provider(&self) -> &P {
        &self.provider
    }

    /// Whether a file with this name was already processed.
    pub fn has_processed(&self, name: &str) -> bool {
        self.processed.contains(name)
    }

    /// Send a user message and append the reply.
    ///
    /// A provider failure becomes an assistant turn starting with `❌`.
    pub async fn submit_text(&mut self, text: &str) -> ConversationTurn {
        self.transcript.push_user(text);
        self.request_reply(None).await
    }

    /// Extract an uploaded file and ask the model about it.
    pub async fn upload(&mut self, artifact: &UploadedArtifact) -> UploadOutcome {
        let name = artifact.name();
        if self.processed.contains(name) {
            debug!(session = %self.id, file = %name, "Skipping already processed upload");
            return UploadOutcome::AlreadyProcessed;
        }

        let result = self.extractor.classify_and_extract(artifact);
        self.processed.insert(name.to_string());
        info!(
            session = %self.id,
            file = %name,
            kind = result.kind(),
            truncated = result.is_truncated(),
            "Processed upload"
        );

        match PromptBuilder::new(name).build(&result) {
            Some(prompt) => {
                self.transcript.push_user(prompt.text);
                UploadOutcome::Answered(self.request_reply(prompt.image).await)
            }
            None => {
                let reason = match result {
                    ExtractionResult::Unsupported { reason } => reason,
                    _ => format!("{} could not be processed", name),
                };
                let turn = ConversationTurn::assistant(format!("⚠ {}", reason));
                self.transcript.push(turn.clone());
                UploadOutcome::Rejected(turn)
            }
        }
    }

    /// Clear the conversation back to the preamble and forget uploads.
    pub fn reset(&mut self) {
        self.transcript.reset();
        self.processed.clear();
        info!(session = %self.id, "Conversation reset");
    }

    async fn request_reply(&mut self, image: Option<ImageAttachment>) -> ConversationTurn {
        let mut request = ChatRequest::new(self.transcript.turns());
        if let Some(image) = image {
            request = request.with_image(image);
        }

        debug!(
            session = %self.id,
            provider = self.provider.name(),
            turns = request.messages.len(),
            "Requesting reply"
        );

        let content = match self.provider.complete(&request).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(
                    session = %self.id,
                    provider = self.provider.name(),
                    error = %e,
                    "Provider call failed"
                );
                format!("❌ {}", e)
            }
        };

        let turn = ConversationTurn::assistant(content);
        self.transcript.push(turn.clone());
        turn
    }
}
