//! Ollama Provider Implementation
//!
//! Talks to a local Ollama daemon through its `/api/generate` endpoint.
//! Only the last user turn is sent as the prompt; a leading system turn is
//! passed as `system`. Attached images go in `images` as base64.
//!
//! # Examples
//!
//! ```no_run
//! use codepilot_llm::OllamaProvider;
//!
//! let provider = OllamaProvider::new("http://localhost:11434", "llava").unwrap();
//! ```

use crate::{http_client, send_error, status_error, LlmError, DEFAULT_TIMEOUT_SECS};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use codepilot_domain::{ChatProvider, ChatRequest, Role};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default Ollama API endpoint
pub const DEFAULT_ENDPOINT: &str = "http://localhost:11434";

/// Ollama API provider for local inference
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    endpoint: String,
    model: String,
    client: reqwest::Client,
}

/// Request body for Ollama generate API
#[derive(Serialize)]
struct OllamaGenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    images: Option<Vec<String>>,
    stream: bool,
}

/// Response from Ollama generate API
#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

impl OllamaProvider {
    /// Create a new Ollama provider
    ///
    /// # Parameters
    ///
    /// - `endpoint`: Ollama API endpoint (e.g., "http://localhost:11434")
    /// - `model`: Model to use (e.g., "llava", "codellama")
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self, LlmError> {
        let endpoint: String = endpoint.into();
        Ok(Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            model: model.into(),
            client: http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
        })
    }

    /// Create a new Ollama provider on `http://localhost:11434`
    pub fn default_endpoint(model: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, model)
    }

    /// Replace the request timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self, LlmError> {
        self.client = http_client(timeout)?;
        Ok(self)
    }

    /// Endpoint this provider posts to
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Model name sent with each request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate a reply using the Ollama API
    ///
    /// # Errors
    ///
    /// - [`LlmError::NetworkUnavailable`] if the daemon is not running
    /// - [`LlmError::ModelNotAvailable`] if the daemon answers 404
    /// - [`LlmError::Provider`] for any other non-success status
    /// - [`LlmError::InvalidResponse`] if the body has no `response` field
    pub async fn generate(&self, request: &ChatRequest) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.endpoint);

        let prompt = request
            .messages
            .iter()
            .rev()
            .find(|t| t.role == Role::User)
            .map(|t| t.content.as_str())
            .ok_or_else(|| LlmError::InvalidRequest("no user turn to send".to_string()))?;

        let system = request
            .messages
            .first()
            .filter(|t| t.role == Role::System)
            .map(|t| t.content.as_str());

        let images = request
            .image
            .as_ref()
            .map(|image| vec![STANDARD.encode(&image.data)]);

        let body = OllamaGenerateRequest {
            model: &self.model,
            prompt,
            system,
            images,
            stream: false,
        };

        debug!(url = %url, model = %self.model, "Posting to Ollama");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, &format!("local model daemon at {}", self.endpoint)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;
        Ok(parsed.response)
    }
}

impl ChatProvider for OllamaProvider {
    type Error = LlmError;

    fn name(&self) -> &str {
        "ollama"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.generate(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use codepilot_domain::ConversationTurn;

    #[test]
    fn test_ollama_provider_creation() {
        let provider = OllamaProvider::new("http://localhost:11434/", "llava").unwrap();
        assert_eq!(provider.endpoint(), "http://localhost:11434");
        assert_eq!(provider.model(), "llava");
    }

    #[test]
    fn test_ollama_provider_default_endpoint() {
        let provider = OllamaProvider::default_endpoint("mistral").unwrap();
        assert_eq!(provider.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(provider.name(), "ollama");
    }

    #[test]
    fn test_request_body_omits_absent_fields() {
        let body = OllamaGenerateRequest {
            model: "llava",
            prompt: "hi",
            system: None,
            images: None,
            stream: false,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json, serde_json::json!({"model": "llava", "prompt": "hi", "stream": false}));
    }

    #[tokio::test]
    async fn test_request_without_user_turn_is_rejected() {
        let provider = OllamaProvider::default_endpoint("llava").unwrap();
        let request = ChatRequest::new(&[ConversationTurn::system("rules")]);
        let result = provider.generate(&request).await;
        assert!(matches!(result, Err(LlmError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_ollama_unreachable() {
        // Nothing listens on port 1
        let provider = OllamaProvider::new("http://127.0.0.1:1", "llava").unwrap();
        let request = ChatRequest::new(&[ConversationTurn::user("test")]);

        match provider.generate(&request).await {
            Err(LlmError::NetworkUnavailable(target)) => {
                assert!(target.contains("127.0.0.1:1"));
            }
            other => panic!("Expected NetworkUnavailable, got {:?}", other),
        }
    }
}
