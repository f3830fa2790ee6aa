//! One-shot ask command implementation.

use crate::cli::AskArgs;
use crate::error::{CliError, Result};
use crate::output::Formatter;
use crate::session::{ChatSession, UploadOutcome};
use codepilot_domain::{ChatProvider, ConversationTurn, UploadedArtifact};

/// Execute the ask command.
///
/// Returns every turn produced, in order; each is also printed.
pub async fn execute_ask<P: ChatProvider>(
    args: AskArgs,
    session: &mut ChatSession<P>,
    formatter: &Formatter,
) -> Result<Vec<ConversationTurn>> {
    let text = args.text.trim();
    if text.is_empty() && args.file.is_none() {
        return Err(CliError::InvalidInput(
            "Nothing to ask: give a question, a --file, or both".to_string(),
        ));
    }

    let mut replies = Vec::new();

    if let Some(path) = &args.file {
        let artifact = UploadedArtifact::from_path(path)?;
        eprintln!("{}", formatter.thinking());
        match session.upload(&artifact).await {
            UploadOutcome::Answered(turn) | UploadOutcome::Rejected(turn) => {
                println!("{}", formatter.format_turn(&turn)?);
                replies.push(turn);
            }
            UploadOutcome::AlreadyProcessed => {}
        }
    }

    if !text.is_empty() {
        eprintln!("{}", formatter.thinking());
        let turn = session.submit_text(text).await;
        println!("{}", formatter.format_turn(&turn)?);
        replies.push(turn);
    }

    Ok(replies)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use codepilot_llm::MockProvider;
    use std::fs;

    fn formatter() -> Formatter {
        Formatter::new(OutputFormat::Quiet, false)
    }

    #[tokio::test]
    async fn test_ask_text_only() {
        let mut session = ChatSession::new(MockProvider::new("42"));
        let args = AskArgs {
            text: "meaning?".to_string(),
            file: None,
        };

        let replies = execute_ask(args, &mut session, &formatter()).await.unwrap();
        assert_eq!(replies, vec![ConversationTurn::assistant("42")]);
    }

    #[tokio::test]
    async fn test_ask_with_file_uploads_first() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("lib.rs");
        fs::write(&path, "fn main() {}\n").unwrap();

        let provider = MockProvider::new("ok");
        let mut session = ChatSession::new(provider.clone());
        let args = AskArgs {
            text: "any bugs?".to_string(),
            file: Some(path),
        };

        let replies = execute_ask(args, &mut session, &formatter()).await.unwrap();
        assert_eq!(replies.len(), 2);
        assert_eq!(provider.call_count(), 2);

        let first = &provider.requests()[0];
        assert!(first.messages[1].content.starts_with("Explain this Rust code:"));
        assert!(session.has_processed("lib.rs"));
    }

    #[tokio::test]
    async fn test_ask_nothing_is_invalid() {
        let mut session = ChatSession::new(MockProvider::default());
        let args = AskArgs {
            text: "  ".to_string(),
            file: None,
        };
        let result = execute_ask(args, &mut session, &formatter()).await;
        assert!(matches!(result, Err(CliError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_ask_missing_file_is_io_error() {
        let mut session = ChatSession::new(MockProvider::default());
        let args = AskArgs {
            text: String::new(),
            file: Some("/definitely/not/here.py".into()),
        };
        let result = execute_ask(args, &mut session, &formatter()).await;
        assert!(matches!(result, Err(CliError::Io(_))));
    }
}
