//! Interactive REPL (Read-Eval-Print Loop) mode.

use crate::config::Config;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::session::{ChatSession, UploadOutcome};
use codepilot_domain::{ChatProvider, UploadedArtifact};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::path::PathBuf;
use tracing::debug;

/// REPL command type.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Exit,
    Help,
    New,
    History,
    Upload(PathBuf),
    Chat(String),
}

/// Run the interactive REPL.
pub async fn run_repl<P: ChatProvider>(
    session: &mut ChatSession<P>,
    config: &Config,
    formatter: &Formatter,
) -> Result<()> {
    println!(
        "{}",
        formatter.info("Codepilot - ask about code, or /upload a file. /help for commands, /exit to quit")
    );
    println!();

    let editor_config = rustyline::Config::builder()
        .max_history_size(config.settings.history_size)?
        .build();
    let mut editor = DefaultEditor::with_config(editor_config)?;

    let history_path = get_history_path()?;
    if editor.load_history(&history_path).is_err() {
        debug!(path = %history_path.display(), "No history loaded");
    }

    loop {
        match editor.readline("codepilot> ") {
            Ok(line) => {
                let line = line.trim();

                if line.is_empty() {
                    continue;
                }

                editor.add_history_entry(line).ok();

                match parse_repl_command(line) {
                    Ok(ReplCommand::Exit) => {
                        println!("{}", formatter.info("Goodbye!"));
                        break;
                    }
                    Ok(ReplCommand::Help) => {
                        print_help(formatter);
                    }
                    Ok(cmd) => {
                        if let Err(e) = execute_repl_command(cmd, session, formatter).await {
                            eprintln!("{}", formatter.error(&e.to_string()));
                        }
                    }
                    Err(e) => {
                        eprintln!("{}", formatter.error(&e.to_string()));
                    }
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("{}", formatter.info("Use /exit to quit"));
            }
            Err(ReadlineError::Eof) => {
                break;
            }
            Err(err) => {
                eprintln!("{}", formatter.error(&format!("Error: {}", err)));
                break;
            }
        }
    }

    editor.save_history(&history_path).ok();

    Ok(())
}

/// Parse a REPL command line. Anything not starting with `/` is chat.
fn parse_repl_command(line: &str) -> Result<ReplCommand> {
    let line = line.trim();
    if line.is_empty() {
        return Err(CliError::InvalidInput("Empty command".to_string()));
    }

    if !line.starts_with('/') {
        return Ok(ReplCommand::Chat(line.to_string()));
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };

    match command {
        "/exit" | "/quit" | "/q" => Ok(ReplCommand::Exit),
        "/help" | "/?" => Ok(ReplCommand::Help),
        "/new" | "/clear" => Ok(ReplCommand::New),
        "/history" => Ok(ReplCommand::History),
        "/upload" => {
            if rest.is_empty() {
                return Err(CliError::InvalidInput("Usage: /upload <path>".to_string()));
            }
            Ok(ReplCommand::Upload(PathBuf::from(rest)))
        }
        _ => Err(CliError::InvalidInput(format!(
            "Unknown command: {}. Type /help for available commands.",
            command
        ))),
    }
}

/// Execute a REPL command.
async fn execute_repl_command<P: ChatProvider>(
    cmd: ReplCommand,
    session: &mut ChatSession<P>,
    formatter: &Formatter,
) -> Result<()> {
    match cmd {
        ReplCommand::Chat(text) => {
            println!("{}", formatter.thinking());
            let turn = session.submit_text(&text).await;
            println!("{}\n", formatter.format_turn(&turn)?);
        }
        ReplCommand::Upload(path) => {
            let artifact = UploadedArtifact::from_path(&path)?;
            println!(
                "{}",
                formatter.info(&format!("Uploaded {}. Generating explanation…", artifact.name()))
            );
            match session.upload(&artifact).await {
                UploadOutcome::AlreadyProcessed => {
                    println!(
                        "{}",
                        formatter.warning(&format!(
                            "{} was already processed; use /new to start over",
                            artifact.name()
                        ))
                    );
                }
                UploadOutcome::Rejected(turn) | UploadOutcome::Answered(turn) => {
                    println!("{}\n", formatter.format_turn(&turn)?);
                }
            }
        }
        ReplCommand::New => {
            session.reset();
            println!("{}", formatter.success("Started a new conversation"));
        }
        ReplCommand::History => {
            println!("{}", formatter.info(&format!("Session {}", session.id().short())));
            println!(
                "{}",
                formatter.format_transcript(session.transcript().visible_turns())?
            );
        }
        ReplCommand::Exit | ReplCommand::Help => {}
    }

    Ok(())
}

fn get_history_path() -> Result<PathBuf> {
    let home = dirs::home_dir()
        .ok_or_else(|| CliError::Config("Could not find home directory".into()))?;
    let codepilot_dir = home.join(".codepilot");
    std::fs::create_dir_all(&codepilot_dir)?;
    Ok(codepilot_dir.join("history.txt"))
}

fn print_help(formatter: &Formatter) {
    println!("{}", formatter.info("Available commands:"));
    println!();
    println!("  <text>                         - Ask about code");
    println!("  /upload <path>                 - Upload a source file, PDF, or image");
    println!("  /new                           - Clear the conversation");
    println!("  /history                       - Show the conversation so far");
    println!("  /help, /?                      - Show this help");
    println!("  /exit, /quit, /q               - Exit");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use codepilot_llm::MockProvider;

    #[test]
    fn test_plain_text_is_chat() {
        assert_eq!(
            parse_repl_command("why does this loop forever?").unwrap(),
            ReplCommand::Chat("why does this loop forever?".to_string())
        );
    }

    #[test]
    fn test_slash_commands() {
        assert_eq!(parse_repl_command("/exit").unwrap(), ReplCommand::Exit);
        assert_eq!(parse_repl_command("/q").unwrap(), ReplCommand::Exit);
        assert_eq!(parse_repl_command("/new").unwrap(), ReplCommand::New);
        assert_eq!(parse_repl_command("/history").unwrap(), ReplCommand::History);
        assert_eq!(parse_repl_command("/help").unwrap(), ReplCommand::Help);
    }

    #[test]
    fn test_upload_keeps_spaces_in_path() {
        assert_eq!(
            parse_repl_command("/upload  my scripts/run.py ").unwrap(),
            ReplCommand::Upload(PathBuf::from("my scripts/run.py"))
        );
    }

    #[test]
    fn test_upload_without_path() {
        assert!(matches!(
            parse_repl_command("/upload"),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_unknown_command() {
        assert!(matches!(
            parse_repl_command("/frobnicate"),
            Err(CliError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_new_resets_session() {
        let mut session = ChatSession::new(MockProvider::new("ok"));
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        execute_repl_command(ReplCommand::Chat("hi".to_string()), &mut session, &formatter)
            .await
            .unwrap();
        assert_eq!(session.transcript().visible_turns().len(), 2);

        execute_repl_command(ReplCommand::New, &mut session, &formatter)
            .await
            .unwrap();
        assert!(session.transcript().visible_turns().is_empty());
    }

    #[tokio::test]
    async fn test_upload_missing_file_is_error() {
        let mut session = ChatSession::new(MockProvider::default());
        let formatter = Formatter::new(OutputFormat::Quiet, false);

        let result = execute_repl_command(
            ReplCommand::Upload(PathBuf::from("/no/such/file.py")),
            &mut session,
            &formatter,
        )
        .await;
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
