//! Codepilot CLI library.
//!
//! Configuration, provider selection, the chat session, the REPL, and the
//! one-shot commands behind the `codepilot` binary.

pub mod backend;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;
pub mod repl;
pub mod session;

pub use backend::Backend;
pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use output::Formatter;
pub use session::{ChatSession, UploadOutcome};
