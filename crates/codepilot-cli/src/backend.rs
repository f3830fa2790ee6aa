//! Provider selection from the active profile.

use crate::config::{Config, Profile, ProviderKind};
use crate::error::Result;
use codepilot_domain::{ChatProvider, ChatRequest};
use codepilot_llm::{ChatCompletionsProvider, LlmError, OllamaProvider};
use std::time::Duration;
use tracing::debug;

/// The provider a profile resolves to.
#[derive(Debug, Clone)]
pub enum Backend {
    /// Hosted chat-completions endpoint
    Hosted(ChatCompletionsProvider),
    /// Local Ollama daemon
    Local(OllamaProvider),
}

impl Backend {
    /// Build the backend for the active profile.
    ///
    /// `api_key` overrides the profile's environment variable.
    pub fn from_config(config: &Config, api_key: Option<String>) -> Result<Self> {
        let profile = config.get_active_profile()?;
        Self::from_profile(profile, config, api_key)
    }

    /// Build the backend for a specific profile.
    pub fn from_profile(profile: &Profile, config: &Config, api_key: Option<String>) -> Result<Self> {
        let timeout = Duration::from_secs(config.settings.timeout_secs);
        debug!(
            provider = %profile.provider,
            endpoint = %profile.endpoint,
            model = %profile.model,
            "Building provider"
        );

        let backend = match profile.provider {
            ProviderKind::ChatCompletions => {
                // A missing key surfaces on the first call, not here
                let key = api_key.or_else(|| profile.api_key()).unwrap_or_default();
                let provider = ChatCompletionsProvider::new(&profile.endpoint, key, &profile.model)?
                    .with_temperature(config.settings.temperature)
                    .with_max_tokens(config.settings.max_tokens)
                    .with_timeout(timeout)?;
                Backend::Hosted(provider)
            }
            ProviderKind::Ollama => {
                let provider =
                    OllamaProvider::new(&profile.endpoint, &profile.model)?.with_timeout(timeout)?;
                Backend::Local(provider)
            }
        };
        Ok(backend)
    }
}

impl ChatProvider for Backend {
    type Error = LlmError;

    fn name(&self) -> &str {
        match self {
            Backend::Hosted(provider) => provider.name(),
            Backend::Local(provider) => provider.name(),
        }
    }

    async fn complete(&self, request: &ChatRequest) -> std::result::Result<String, LlmError> {
        match self {
            Backend::Hosted(provider) => provider.complete(request).await,
            Backend::Local(provider) => provider.complete(request).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_is_hosted() {
        let config = Config::default();
        let backend = Backend::from_config(&config, Some("key".to_string())).unwrap();
        assert!(matches!(backend, Backend::Hosted(_)));
        assert_eq!(backend.name(), "chat-completions");
    }

    #[test]
    fn test_local_profile() {
        let mut config = Config::default();
        config.switch_profile("local".to_string()).unwrap();
        let backend = Backend::from_config(&config, None).unwrap();
        match backend {
            Backend::Local(provider) => assert_eq!(provider.model(), "llava"),
            other => panic!("Expected local backend, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_active_profile() {
        let mut config = Config::default();
        config.active_profile = "gone".to_string();
        assert!(Backend::from_config(&config, None).is_err());
    }
}
