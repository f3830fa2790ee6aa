//! Hosted chat-completions provider
//!
//! Speaks the OpenAI-compatible `/v1/chat/completions` dialect used by
//! Together and most hosted inference services. The whole transcript is sent
//! on every call.

use crate::{http_client, send_error, status_error, LlmError, DEFAULT_TIMEOUT_SECS};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use codepilot_domain::{ChatProvider, ChatRequest, ConversationTurn, ImageAttachment, Role};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default hosted endpoint
pub const DEFAULT_ENDPOINT: &str = "https://api.together.xyz/v1/chat/completions";

/// Default hosted model
pub const DEFAULT_MODEL: &str = "mistralai/Mistral-7B-Instruct-v0.1";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Default completion length cap
pub const DEFAULT_MAX_TOKENS: u32 = 512;

/// Provider for hosted chat-completion endpoints
#[derive(Debug, Clone)]
pub struct ChatCompletionsProvider {
    endpoint: String,
    api_key: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<WireMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: WireContent<'a>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum WireContent<'a> {
    Text(&'a str),
    Parts(Vec<ContentPart<'a>>),
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentPart<'a> {
    Text { text: &'a str },
    ImageUrl { image_url: ImageUrl },
}

#[derive(Serialize)]
struct ImageUrl {
    url: String,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

fn data_url(image: &ImageAttachment) -> String {
    format!("data:{};base64,{}", image.media_type, STANDARD.encode(&image.data))
}

/// Convert turns into wire messages, attaching the image to the last user turn
fn wire_messages<'a>(
    turns: &'a [ConversationTurn],
    image: Option<&ImageAttachment>,
) -> Vec<WireMessage<'a>> {
    let image_at = image.and_then(|_| turns.iter().rposition(|t| t.role == Role::User));

    turns
        .iter()
        .enumerate()
        .map(|(i, turn)| {
            let content = match (image, image_at) {
                (Some(image), Some(at)) if at == i => WireContent::Parts(vec![
                    ContentPart::Text {
                        text: &turn.content,
                    },
                    ContentPart::ImageUrl {
                        image_url: ImageUrl {
                            url: data_url(image),
                        },
                    },
                ]),
                _ => WireContent::Text(&turn.content),
            };
            WireMessage {
                role: turn.role.as_str(),
                content,
            }
        })
        .collect()
}

impl ChatCompletionsProvider {
    /// Create a provider for `endpoint` using `api_key` and `model`
    pub fn new(
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Result<Self, LlmError> {
        Ok(Self {
            endpoint: endpoint.into(),
            api_key: api_key.into(),
            model: model.into(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
            client: http_client(Duration::from_secs(DEFAULT_TIMEOUT_SECS))?,
        })
    }

    /// Create a provider with the default hosted endpoint and model
    pub fn together(api_key: impl Into<String>) -> Result<Self, LlmError> {
        Self::new(DEFAULT_ENDPOINT, api_key, DEFAULT_MODEL)
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion length cap
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
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

    /// Send the transcript and return the first choice's content
    ///
    /// # Errors
    ///
    /// - [`LlmError::Configuration`] if no API key is set
    /// - [`LlmError::NetworkUnavailable`] if the endpoint cannot be reached
    /// - [`LlmError::Provider`] for a non-success status, body verbatim
    /// - [`LlmError::InvalidResponse`] if the body has no choice content
    pub async fn chat(&self, request: &ChatRequest) -> Result<String, LlmError> {
        if self.api_key.trim().is_empty() {
            return Err(LlmError::Configuration("no API key configured".to_string()));
        }

        let body = CompletionRequest {
            model: &self.model,
            messages: wire_messages(&request.messages, request.image.as_ref()),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!(
            endpoint = %self.endpoint,
            model = %self.model,
            messages = body.messages.len(),
            image = request.image.is_some(),
            "Posting chat completion"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| send_error(e, &self.endpoint))?;

        if !response.status().is_success() {
            return Err(status_error(response).await);
        }

        let parsed: CompletionResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse response: {}", e)))?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("response has no choices".to_string()))
    }
}

impl ChatProvider for ChatCompletionsProvider {
    type Error = LlmError;

    fn name(&self) -> &str {
        "chat-completions"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.chat(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let provider = ChatCompletionsProvider::together("key").unwrap();
        assert_eq!(provider.endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(provider.model(), DEFAULT_MODEL);
        assert_eq!(provider.temperature, 0.7);
        assert_eq!(provider.max_tokens, 512);
    }

    #[test]
    fn test_text_messages_serialize_as_strings() {
        let turns = vec![ConversationTurn::system("rules"), ConversationTurn::user("hi")];
        let json = serde_json::to_value(wire_messages(&turns, None)).unwrap();
        assert_eq!(
            json,
            json!([
                {"role": "system", "content": "rules"},
                {"role": "user", "content": "hi"}
            ])
        );
    }

    #[test]
    fn test_image_goes_on_last_user_turn() {
        let turns = vec![
            ConversationTurn::user("first"),
            ConversationTurn::assistant("ok"),
            ConversationTurn::user("describe"),
        ];
        let image = ImageAttachment::new("image/png", vec![1, 2, 3]);
        let json = serde_json::to_value(wire_messages(&turns, Some(&image))).unwrap();

        assert_eq!(json[0]["content"], "first");
        assert_eq!(json[1]["content"], "ok");
        assert_eq!(
            json[2]["content"],
            json!([
                {"type": "text", "text": "describe"},
                {"type": "image_url", "image_url": {"url": "data:image/png;base64,AQID"}}
            ])
        );
    }

    #[tokio::test]
    async fn test_missing_api_key() {
        let provider = ChatCompletionsProvider::together("").unwrap();
        let request = ChatRequest::new(&[ConversationTurn::user("hi")]);
        let result = provider.chat(&request).await;
        assert!(matches!(result, Err(LlmError::Configuration(_))));
    }
}
