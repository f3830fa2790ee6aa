//! Output formatting for the CLI.

use crate::config::{Config, OutputFormat};
use crate::error::Result;
use codepilot_domain::{ConversationTurn, Role};
use codepilot_extractor::{ExtractionResult, TextSource};
use colored::*;
use tabled::{
    builder::Builder,
    settings::{object::Rows, Alignment, Modify, Style},
};

/// Output formatter.
pub struct Formatter {
    format: OutputFormat,
    color_enabled: bool,
}

impl Formatter {
    /// Create a new formatter.
    pub fn new(format: OutputFormat, color_enabled: bool) -> Self {
        Self {
            format,
            color_enabled,
        }
    }

    /// Selected output format.
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Format one conversation turn.
    pub fn format_turn(&self, turn: &ConversationTurn) -> Result<String> {
        match self.format {
            OutputFormat::Json => Ok(serde_json::to_string_pretty(&turn_json(turn))?),
            OutputFormat::Table => Ok(format!("{}\n{}", self.role_label(turn.role), turn.content)),
            OutputFormat::Quiet => Ok(turn.content.clone()),
        }
    }

    /// Format the visible part of a transcript.
    pub fn format_transcript(&self, turns: &[ConversationTurn]) -> Result<String> {
        match self.format {
            OutputFormat::Json => {
                let turns: Vec<serde_json::Value> = turns.iter().map(turn_json).collect();
                Ok(serde_json::to_string_pretty(&turns)?)
            }
            _ if turns.is_empty() => Ok(self.colorize("No messages yet.", "yellow")),
            _ => {
                let rendered: Vec<String> = turns
                    .iter()
                    .map(|turn| self.format_turn(turn))
                    .collect::<Result<_>>()?;
                Ok(rendered.join("\n\n"))
            }
        }
    }

    /// Format an extraction result for the `extract` command.
    pub fn format_extraction(&self, file_name: &str, result: &ExtractionResult) -> Result<String> {
        match self.format {
            OutputFormat::Json => self.format_extraction_json(file_name, result),
            OutputFormat::Table => self.format_extraction_table(file_name, result),
            OutputFormat::Quiet => Ok(extraction_payload(result)),
        }
    }

    fn format_extraction_json(&self, file_name: &str, result: &ExtractionResult) -> Result<String> {
        let mut value = serde_json::json!({
            "file": file_name,
            "kind": result.kind(),
            "truncated": result.is_truncated(),
            "payload": extraction_payload(result),
        });

        match result {
            ExtractionResult::SourceCode { language, .. } => {
                value["language"] = serde_json::json!(language.name());
            }
            ExtractionResult::Document { source, .. } => {
                value["text_source"] = serde_json::json!(text_source(*source));
            }
            ExtractionResult::Image(image) => {
                let (width, height) = image.dimensions();
                value["media_type"] = serde_json::json!(image.media_type);
                value["width"] = serde_json::json!(width);
                value["height"] = serde_json::json!(height);
            }
            _ => {}
        }

        Ok(serde_json::to_string_pretty(&value)?)
    }

    fn format_extraction_table(&self, file_name: &str, result: &ExtractionResult) -> Result<String> {
        let mut builder = Builder::default();
        builder.push_record(["Field", "Value"]);
        builder.push_record(["File", file_name]);
        builder.push_record(["Kind", result.kind()]);

        match result {
            ExtractionResult::SourceCode { language, .. } => {
                let name = if language.is_unknown() { "-" } else { language.name() };
                builder.push_record(["Language", name]);
            }
            ExtractionResult::Document { source, .. } => {
                builder.push_record(["Text source", text_source(*source)]);
            }
            ExtractionResult::Image(image) => {
                let (width, height) = image.dimensions();
                builder.push_record(["Media type", image.media_type.as_str()]);
                builder.push_record(["Dimensions".to_string(), format!("{}x{}", width, height)]);
            }
            _ => {}
        }

        if let Some(text) = result.text() {
            builder.push_record(["Characters".to_string(), text.chars().count().to_string()]);
        }
        builder.push_record(["Truncated", if result.is_truncated() { "yes" } else { "no" }]);

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        let payload = extraction_payload(result);
        if payload.is_empty() {
            Ok(table.to_string())
        } else {
            Ok(format!("{}\n{}", table, payload))
        }
    }

    /// Format the profile table.
    pub fn format_profiles(&self, config: &Config) -> Result<String> {
        if let OutputFormat::Json = self.format {
            let profiles: Vec<serde_json::Value> = config
                .profiles
                .iter()
                .map(|(name, profile)| {
                    serde_json::json!({
                        "name": name,
                        "active": name == &config.active_profile,
                        "provider": profile.provider.as_str(),
                        "endpoint": profile.endpoint,
                        "model": profile.model,
                        "api_key_env": profile.api_key_env,
                    })
                })
                .collect();
            return Ok(serde_json::to_string_pretty(&profiles)?);
        }

        if config.profiles.is_empty() {
            return Ok(self.info("No profiles configured"));
        }

        if let OutputFormat::Quiet = self.format {
            let names: Vec<&str> = config.profiles.keys().map(String::as_str).collect();
            return Ok(names.join("\n"));
        }

        let mut builder = Builder::default();
        builder.push_record(["", "Name", "Provider", "Endpoint", "Model", "Key env"]);
        for (name, profile) in &config.profiles {
            let marker = if name == &config.active_profile { "*" } else { "" };
            builder.push_record([
                marker,
                name.as_str(),
                profile.provider.as_str(),
                profile.endpoint.as_str(),
                profile.model.as_str(),
                profile.api_key_env.as_str(),
            ]);
        }

        let mut table = builder.build();
        table
            .with(Style::rounded())
            .with(Modify::new(Rows::first()).with(Alignment::center()));

        Ok(table.to_string())
    }

    /// Line shown while waiting on the model.
    pub fn thinking(&self) -> String {
        self.colorize("Codepilot is thinking…", "magenta")
    }

    /// Format a success message.
    pub fn success(&self, message: &str) -> String {
        self.colorize(&format!("✓ {}", message), "green")
    }

    /// Format an error message.
    pub fn error(&self, message: &str) -> String {
        self.colorize(&format!("✗ {}", message), "red")
    }

    /// Format an info message.
    pub fn info(&self, message: &str) -> String {
        self.colorize(&format!("ℹ {}", message), "blue")
    }

    /// Format a warning message.
    pub fn warning(&self, message: &str) -> String {
        self.colorize(&format!("⚠ {}", message), "yellow")
    }

    fn role_label(&self, role: Role) -> String {
        match role {
            Role::User => self.colorize("You", "cyan"),
            Role::Assistant => self.colorize("Codepilot", "green"),
            Role::System => self.colorize("System", "yellow"),
        }
    }

    /// Colorize text if color is enabled.
    fn colorize(&self, text: &str, color: &str) -> String {
        if !self.color_enabled {
            return text.to_string();
        }

        match color {
            "red" => text.red().to_string(),
            "green" => text.green().bold().to_string(),
            "blue" => text.blue().to_string(),
            "yellow" => text.yellow().to_string(),
            "cyan" => text.cyan().bold().to_string(),
            "magenta" => text.magenta().italic().to_string(),
            _ => text.to_string(),
        }
    }
}

fn turn_json(turn: &ConversationTurn) -> serde_json::Value {
    serde_json::json!({
        "role": turn.role.as_str(),
        "content": turn.content,
    })
}

fn text_source(source: TextSource) -> &'static str {
    match source {
        TextSource::TextLayer => "text layer",
        TextSource::Ocr => "ocr",
        TextSource::None => "none",
    }
}

/// Text payload of a result; images and rejections have a one-line summary.
fn extraction_payload(result: &ExtractionResult) -> String {
    match result {
        ExtractionResult::Image(image) => {
            let (width, height) = image.dimensions();
            format!("[{} image, {}x{}]", image.media_type, width, height)
        }
        ExtractionResult::Unsupported { reason } => reason.clone(),
        other => other.text().unwrap_or_default().to_string(),
    }
}
