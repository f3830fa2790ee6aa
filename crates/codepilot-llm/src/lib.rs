//! Codepilot LLM Provider Layer
//!
//! Implementations of the `ChatProvider` trait from `codepilot-domain`.
//!
//! # Providers
//!
//! - `ChatCompletionsProvider`: hosted chat-completion endpoint (Together, OpenAI-compatible)
//! - `OllamaProvider`: local Ollama daemon
//! - `MockProvider`: deterministic mock for testing
//!
//! Every provider makes exactly one HTTP request per call. There are no
//! retries; a failure is reported once as an [`LlmError`].
//!
//! # Examples
//!
//! ```
//! use codepilot_domain::{ChatProvider, ChatRequest, ConversationTurn};
//! use codepilot_llm::MockProvider;
//!
//! # tokio_test_block_on(async {
//! let provider = MockProvider::new("Hello from LLM!");
//! let request = ChatRequest::new(&[ConversationTurn::user("hi")]);
//! assert_eq!(provider.complete(&request).await.unwrap(), "Hello from LLM!");
//! # });
//! # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
//! # }
//! ```

#![warn(missing_docs)]

pub mod chat_completions;
pub mod ollama;

use codepilot_domain::Role;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

pub use chat_completions::ChatCompletionsProvider;
pub use codepilot_domain::{ChatProvider, ChatRequest};
pub use ollama::OllamaProvider;

/// Default timeout for provider requests (120 seconds)
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Errors that can occur during provider calls
#[derive(Error, Debug)]
pub enum LlmError {
    /// The endpoint could not be reached at all
    #[error("Cannot connect to {0}")]
    NetworkUnavailable(String),

    /// The provider answered with a non-success status; body is verbatim
    #[error("Error {status}: {body}")]
    Provider {
        /// HTTP status code
        status: u16,
        /// Response body as returned
        body: String,
    },

    /// Success status, but the body was not what we expected
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Model not available on the provider
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// The request cannot be sent as built
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Transport failure after connecting (timeout, reset, ...)
    #[error("Communication error: {0}")]
    Communication(String),

    /// Provider is misconfigured (missing key, bad client settings)
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Build the shared HTTP client with a request timeout
pub(crate) fn http_client(timeout: Duration) -> Result<reqwest::Client, LlmError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| LlmError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// Map a transport error, keeping "could not connect" distinct
pub(crate) fn send_error(e: reqwest::Error, target: &str) -> LlmError {
    if e.is_connect() {
        LlmError::NetworkUnavailable(target.to_string())
    } else if e.is_timeout() {
        LlmError::Communication(format!("Request to {} timed out", target))
    } else {
        LlmError::Communication(format!("Request failed: {}", e))
    }
}

/// Turn a non-success response into [`LlmError::Provider`]
pub(crate) async fn status_error(response: reqwest::Response) -> LlmError {
    let status = response.status().as_u16();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    LlmError::Provider { status, body }
}

/// Scripted outcome for [`MockProvider`]
#[derive(Debug, Clone)]
enum MockReply {
    Text(String),
    Status(u16, String),
    Unreachable,
}

impl MockReply {
    fn into_result(self) -> Result<String, LlmError> {
        match self {
            MockReply::Text(text) => Ok(text),
            MockReply::Status(status, body) => Err(LlmError::Provider { status, body }),
            MockReply::Unreachable => Err(LlmError::NetworkUnavailable("mock provider".to_string())),
        }
    }
}

/// Mock provider for deterministic testing
///
/// Replies are keyed on the content of the last user turn. Nothing touches
/// the network.
///
/// # Examples
///
/// ```
/// use codepilot_llm::MockProvider;
///
/// let mut provider = MockProvider::default();
/// provider.add_response("ping", "pong");
/// provider.add_status("boom", 500, "server error");
/// assert_eq!(provider.call_count(), 0);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_reply: MockReply,
    replies: Arc<Mutex<HashMap<String, MockReply>>>,
    requests: Arc<Mutex<Vec<ChatRequest>>>,
}

impl MockProvider {
    /// Create a MockProvider with a fixed reply for all prompts
    pub fn new(response: impl Into<String>) -> Self {
        Self::with_default(MockReply::Text(response.into()))
    }

    /// A provider whose every call fails with the given status and body
    pub fn failing(status: u16, body: impl Into<String>) -> Self {
        Self::with_default(MockReply::Status(status, body.into()))
    }

    /// A provider whose every call fails as if the daemon were down
    pub fn unreachable() -> Self {
        Self::with_default(MockReply::Unreachable)
    }

    fn with_default(default_reply: MockReply) -> Self {
        Self {
            default_reply,
            replies: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Add a specific reply for a given user message
    pub fn add_response(&mut self, prompt: impl Into<String>, response: impl Into<String>) {
        self.lock_replies()
            .insert(prompt.into(), MockReply::Text(response.into()));
    }

    /// Fail with a status and body for a given user message
    pub fn add_status(&mut self, prompt: impl Into<String>, status: u16, body: impl Into<String>) {
        self.lock_replies()
            .insert(prompt.into(), MockReply::Status(status, body.into()));
    }

    /// Number of times `complete` was called
    pub fn call_count(&self) -> usize {
        self.lock_requests().len()
    }

    /// Every request seen so far, oldest first
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.lock_requests().clone()
    }

    /// The most recent request
    pub fn last_request(&self) -> Option<ChatRequest> {
        self.lock_requests().last().cloned()
    }

    /// Forget recorded requests
    pub fn reset_call_count(&self) {
        self.lock_requests().clear();
    }

    fn lock_replies(&self) -> std::sync::MutexGuard<'_, HashMap<String, MockReply>> {
        self.replies.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_requests(&self) -> std::sync::MutexGuard<'_, Vec<ChatRequest>> {
        self.requests.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("Default mock response")
    }
}

impl ChatProvider for MockProvider {
    type Error = LlmError;

    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.lock_requests().push(request.clone());

        let question = request
            .messages
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
            .unwrap_or_default();

        let reply = self
            .lock_replies()
            .get(question)
            .cloned()
            .unwrap_or_else(|| self.default_reply.clone());
        reply.into_result()
    }
}
