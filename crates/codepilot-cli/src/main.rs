//! Codepilot CLI - ask a model about code, documents, and screenshots.

use clap::Parser;
use codepilot_cli::commands;
use codepilot_cli::repl;
use codepilot_cli::{Backend, ChatSession, Cli, Command, Config, Formatter};
use codepilot_extractor::ArtifactExtractor;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("codepilot=debug,codepilot_cli=debug,codepilot_extractor=debug,codepilot_llm=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run() -> codepilot_cli::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = config.path() {
        if !path.exists() {
            config.save()?;
            info!(path = %path.display(), "Wrote default configuration");
        }
    }

    // --profile applies to this run only; profile commands save `config`
    let session_config = config.with_profile_override(cli.profile.as_deref())?;

    let format = cli
        .format
        .map(Into::into)
        .unwrap_or(config.settings.format);
    let color_enabled = !cli.no_color && config.settings.color;
    let formatter = Formatter::new(format, color_enabled);

    match cli.command {
        Some(Command::Extract(args)) => {
            commands::execute_extract(args, &session_config, &formatter)?;
        }
        Some(Command::Profile(args)) => {
            commands::execute_profile(args, &mut config, &formatter)?;
        }
        Some(Command::Ask(args)) => {
            let mut session = build_session(&session_config, cli.api_key)?;
            commands::execute_ask(args, &mut session, &formatter).await?;
        }
        None | Some(Command::Chat) => {
            let mut session = build_session(&session_config, cli.api_key)?;
            repl::run_repl(&mut session, &session_config, &formatter).await?;
        }
    }

    Ok(())
}

fn build_session(config: &Config, api_key: Option<String>) -> codepilot_cli::Result<ChatSession<Backend>> {
    let backend = Backend::from_config(config, api_key)?;
    let session = ChatSession::new(backend)
        .with_system_prompt(config.settings.system_prompt.clone())
        .with_extractor(ArtifactExtractor::new(config.extraction.clone()));
    info!(session = %session.id(), profile = %config.active_profile, "Session started");
    Ok(session)
}
