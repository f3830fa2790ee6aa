//! Configuration management for the CLI.

use crate::error::{CliError, Result};
use codepilot_extractor::ExtractorConfig;
use codepilot_llm::chat_completions;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable holding the hosted provider's API key by default.
pub const DEFAULT_API_KEY_ENV: &str = "TOGETHER_API_KEY";

/// System preamble seeded into every conversation.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful coding assistant. Answer questions \
about code, explain snippets, fix bugs, and suggest improvements.";

/// CLI configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name
    #[serde(default = "default_profile")]
    pub active_profile: String,

    /// Available profiles
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,

    /// Global settings
    #[serde(default)]
    pub settings: Settings,

    /// Upload extraction budgets
    #[serde(default)]
    pub extraction: ExtractorConfig,

    /// File this configuration was loaded from
    #[serde(skip)]
    path: Option<PathBuf>,
}

/// Model provider profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    /// Which provider protocol to speak
    pub provider: ProviderKind,

    /// Endpoint URL
    pub endpoint: String,

    /// Model name
    pub model: String,

    /// Environment variable holding the API key
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
}

/// Provider protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ProviderKind {
    /// Hosted chat-completions endpoint
    ChatCompletions,
    /// Local Ollama daemon
    Ollama,
}

/// Global CLI settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Enable colored output
    #[serde(default = "default_true")]
    pub color: bool,

    /// Default output format
    #[serde(default = "default_format")]
    pub format: OutputFormat,

    /// Command history size
    #[serde(default = "default_history_size")]
    pub history_size: usize,

    /// System preamble for new conversations
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,

    /// Sampling temperature for hosted providers
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Completion length cap for hosted providers
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Table format
    Table,
    /// JSON format
    Json,
    /// Quiet (minimal) format
    Quiet,
}

impl ProviderKind {
    /// Name as written in the config file
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::ChatCompletions => "chat-completions",
            ProviderKind::Ollama => "ollama",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Profile {
    /// Profile for the default hosted endpoint.
    pub fn hosted() -> Self {
        Self {
            provider: ProviderKind::ChatCompletions,
            endpoint: chat_completions::DEFAULT_ENDPOINT.to_string(),
            model: chat_completions::DEFAULT_MODEL.to_string(),
            api_key_env: default_api_key_env(),
        }
    }

    /// Profile for a local Ollama daemon.
    pub fn local(model: impl Into<String>) -> Self {
        Self {
            provider: ProviderKind::Ollama,
            endpoint: codepilot_llm::ollama::DEFAULT_ENDPOINT.to_string(),
            model: model.into(),
            api_key_env: default_api_key_env(),
        }
    }

    /// Read the API key from the profile's environment variable.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
    }
}

impl Config {
    /// Get the default configuration file path.
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
        Ok(home.join(".codepilot").join("config.toml"))
    }

    /// Load configuration from `path`, or the default path.
    ///
    /// A missing file yields the default configuration, remembered against
    /// that path so a later [`Config::save`] creates it.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::default_path()?,
        };

        let mut config = if path.exists() {
            let contents = fs::read_to_string(&path)?;
            toml::from_str::<Config>(&contents)?
        } else {
            Self::default()
        };
        config.validate()?;
        config.path = Some(path);
        Ok(config)
    }

    /// Save configuration to the file it was loaded from.
    pub fn save(&self) -> Result<()> {
        let path = match &self.path {
            Some(path) => path.clone(),
            None => Self::default_path()?,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("Failed to serialize config: {}", e)))?;
        fs::write(&path, contents)?;
        Ok(())
    }

    /// Path this configuration reads from and saves to, if known.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Point this configuration at a different file.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Check the active profile and extraction budgets.
    pub fn validate(&self) -> Result<()> {
        self.extraction.validate().map_err(CliError::Config)?;
        if self.settings.timeout_secs == 0 {
            return Err(CliError::Config("timeout_secs must be greater than 0".into()));
        }
        Ok(())
    }

    /// Get the active profile.
    pub fn get_active_profile(&self) -> Result<&Profile> {
        self.profiles
            .get(&self.active_profile)
            .ok_or_else(|| CliError::Config(format!("Profile '{}' not found", self.active_profile)))
    }

    /// Add or update a profile.
    pub fn set_profile(&mut self, name: String, profile: Profile) {
        self.profiles.insert(name, profile);
    }

    /// Switch to a different profile.
    pub fn switch_profile(&mut self, name: String) -> Result<()> {
        if !self.profiles.contains_key(&name) {
            return Err(CliError::Config(format!("Profile '{}' does not exist", name)));
        }
        self.active_profile = name;
        Ok(())
    }

    /// Copy of this configuration with `name` as the active profile.
    ///
    /// Used for one-invocation overrides that must not reach the saved file.
    pub fn with_profile_override(&self, name: Option<&str>) -> Result<Config> {
        let mut config = self.clone();
        if let Some(name) = name {
            config.switch_profile(name.to_string())?;
        }
        Ok(config)
    }

    /// Remove a profile; the active one cannot be removed.
    pub fn delete_profile(&mut self, name: &str) -> Result<bool> {
        if name == self.active_profile {
            return Err(CliError::NotPermitted(
                "Cannot delete the active profile".to_string(),
            ));
        }
        Ok(self.profiles.remove(name).is_some())
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        profiles.insert("together".to_string(), Profile::hosted());
        profiles.insert("local".to_string(), Profile::local("llava"));

        Self {
            active_profile: default_profile(),
            profiles,
            settings: Settings::default(),
            extraction: ExtractorConfig::default(),
            path: None,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            color: true,
            format: OutputFormat::Table,
            history_size: default_history_size(),
            system_prompt: default_system_prompt(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_profile() -> String {
    "together".to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_true() -> bool {
    true
}

fn default_format() -> OutputFormat {
    OutputFormat::Table
}

fn default_history_size() -> usize {
    1000
}

fn default_system_prompt() -> String {
    DEFAULT_SYSTEM_PROMPT.to_string()
}

fn default_temperature() -> f32 {
    chat_completions::DEFAULT_TEMPERATURE
}

fn default_max_tokens() -> u32 {
    chat_completions::DEFAULT_MAX_TOKENS
}

fn default_timeout_secs() -> u64 {
    codepilot_llm::DEFAULT_TIMEOUT_SECS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.active_profile, "together");
        assert!(config.profiles.contains_key("together"));
        assert!(config.profiles.contains_key("local"));
        assert!(config.settings.color);
        assert_eq!(config.settings.max_tokens, 512);
        assert_eq!(config.settings.timeout_secs, 120);
        assert_eq!(config.extraction.max_source_chars, 4000);
    }

    #[test]
    fn test_profile_management() {
        let mut config = Config::default();

        let profile = Profile {
            provider: ProviderKind::Ollama,
            endpoint: "http://gpu-box:11434".to_string(),
            model: "codellama".to_string(),
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        };

        config.set_profile("gpu".to_string(), profile);
        assert!(config.profiles.contains_key("gpu"));

        config.switch_profile("gpu".to_string()).unwrap();
        assert_eq!(config.active_profile, "gpu");
        assert_eq!(config.get_active_profile().unwrap().model, "codellama");
    }

    #[test]
    fn test_switch_to_nonexistent_profile() {
        let mut config = Config::default();
        let result = config.switch_profile("nonexistent".to_string());
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_override_is_not_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        let mut config = Config::default().with_path(&path);

        let session_config = config.with_profile_override(Some("local")).unwrap();
        assert_eq!(session_config.active_profile, "local");
        assert_eq!(config.active_profile, "together");

        // A profile command saving afterwards keeps the stored active profile
        config.set_profile("gpu".to_string(), Profile::local("codellama"));
        config.save().unwrap();
        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.active_profile, "together");
        assert!(loaded.profiles.contains_key("gpu"));
    }

    #[test]
    fn test_profile_override_must_exist() {
        let config = Config::default();
        assert!(config.with_profile_override(Some("missing")).is_err());
        assert_eq!(
            config.with_profile_override(None).unwrap().active_profile,
            "together"
        );
    }

    #[test]
    fn test_delete_active_profile_refused() {
        let mut config = Config::default();
        assert!(matches!(
            config.delete_profile("together"),
            Err(CliError::NotPermitted(_))
        ));
        assert!(config.delete_profile("local").unwrap());
        assert!(!config.delete_profile("local").unwrap());
    }

    #[test]
    fn test_missing_file_yields_default() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.active_profile, "together");
        assert_eq!(config.path(), Some(path.as_path()));
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default().with_path(&path);
        config.set_profile("local2".to_string(), Profile::local("mistral"));
        config.settings.temperature = 0.2;
        config.extraction.allowed_extensions = Some(vec!["py".to_string()]);
        config.save().unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.profiles["local2"].model, "mistral");
        assert_eq!(loaded.settings.temperature, 0.2);
        assert_eq!(loaded.extraction.allowed_extensions, Some(vec!["py".to_string()]));
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            r#"
active_profile = "mine"

[profiles.mine]
provider = "ollama"
endpoint = "http://localhost:11434"
model = "llava"

[extraction]
max_source_chars = 100
"#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        let profile = config.get_active_profile().unwrap();
        assert_eq!(profile.provider, ProviderKind::Ollama);
        assert_eq!(profile.api_key_env, DEFAULT_API_KEY_ENV);
        assert_eq!(config.settings.system_prompt, DEFAULT_SYSTEM_PROMPT);
        assert_eq!(config.extraction.max_source_chars, 100);
        assert_eq!(config.extraction.preview_bytes, 2000);
    }

    #[test]
    fn test_invalid_extraction_budget_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[extraction]\npreview_bytes = 0\n").unwrap();

        assert!(matches!(Config::load(Some(&path)), Err(CliError::Config(_))));
    }
}
