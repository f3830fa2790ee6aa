//! CLI command definitions and argument parsing.

use crate::config::{OutputFormat, ProviderKind};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Codepilot - Ask a model about your code, files, and screenshots.
#[derive(Debug, Parser)]
#[command(name = "codepilot")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Profile to use
    #[arg(short, long, global = true)]
    pub profile: Option<String>,

    /// API key (overrides the profile's environment variable)
    #[arg(long, global = true, env = "CODEPILOT_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Enable debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Output format options.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format (reply text only)
    Quiet,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interactive chat (default)
    Chat,

    /// Ask a single question, optionally about a file
    Ask(AskArgs),

    /// Classify and extract a file without contacting a model
    Extract(ExtractArgs),

    /// Manage provider profiles
    Profile(ProfileArgs),
}

/// Arguments for the ask command.
#[derive(Debug, Parser)]
pub struct AskArgs {
    /// Question text; may be empty when a file is given
    #[arg(default_value = "")]
    pub text: String,

    /// File to upload before asking
    #[arg(short = 'F', long)]
    pub file: Option<PathBuf>,
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// File to extract
    pub path: PathBuf,

    /// Declared media type (e.g. application/pdf)
    #[arg(short, long)]
    pub media_type: Option<String>,
}

/// Arguments for profile management.
#[derive(Debug, Parser)]
pub struct ProfileArgs {
    #[command(subcommand)]
    pub action: ProfileAction,
}

/// Profile management actions.
#[derive(Debug, Subcommand)]
pub enum ProfileAction {
    /// List all profiles
    List,

    /// Show active profile
    Show,

    /// Switch to a different profile
    Switch {
        /// Profile name
        name: String,
    },

    /// Create or update a profile
    Set {
        /// Profile name
        name: String,
        /// Provider protocol
        #[arg(long, value_enum, default_value = "chat-completions")]
        provider: ProviderArg,
        /// Endpoint URL
        #[arg(short, long)]
        endpoint: String,
        /// Model name
        #[arg(short, long)]
        model: String,
        /// Environment variable holding the API key
        #[arg(long)]
        api_key_env: Option<String>,
    },

    /// Delete a profile
    Delete {
        /// Profile name
        name: String,
    },
}

/// Provider argument.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum ProviderArg {
    /// Hosted chat-completions endpoint
    ChatCompletions,
    /// Local Ollama daemon
    Ollama,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
            CliFormat::Quiet => OutputFormat::Quiet,
        }
    }
}

impl From<ProviderArg> for ProviderKind {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::ChatCompletions => ProviderKind::ChatCompletions,
            ProviderArg::Ollama => ProviderKind::Ollama,
        }
    }
}
