//! Prompt construction from extraction results

use crate::types::{ExtractionResult, TextSource};
use codepilot_domain::ImageAttachment;

const TRUNCATION_NOTE: &str = "(The file was truncated to fit the prompt budget.)";

/// A prompt ready to submit as a user turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    /// Text of the user turn
    pub text: String,

    /// Image sent alongside the text, if any
    pub image: Option<ImageAttachment>,
}

/// Builds the user prompt for an uploaded file
pub struct PromptBuilder {
    file_name: String,
    instruction: Option<String>,
}

impl PromptBuilder {
    /// Create a builder for the named file
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            instruction: None,
        }
    }

    /// Replace the default task instruction (e.g. "Find the bug in this file")
    pub fn with_instruction(mut self, instruction: impl Into<String>) -> Self {
        let instruction = instruction.into();
        if !instruction.trim().is_empty() {
            self.instruction = Some(instruction);
        }
        self
    }

    /// Build the prompt; `None` for [`ExtractionResult::Unsupported`]
    pub fn build(&self, result: &ExtractionResult) -> Option<Prompt> {
        let mut prompt = String::new();

        let image = match result {
            ExtractionResult::SourceCode {
                language,
                text,
                truncated,
            } => {
                let default = if language.is_unknown() {
                    "Explain this code:".to_string()
                } else {
                    format!("Explain this {} code:", language.name())
                };
                self.push_instruction(&mut prompt, &default);
                prompt.push_str(&format!("```{}\n{}\n```", language.tag(), text));
                push_truncation_note(&mut prompt, *truncated);
                None
            }
            ExtractionResult::Document {
                text,
                truncated,
                source,
            } => {
                let default = format!("Summarize this document ({}):", self.file_name);
                self.push_instruction(&mut prompt, &default);
                if *source == TextSource::Ocr {
                    prompt.push_str("(Text recovered by OCR; expect recognition errors.)\n");
                }
                prompt.push_str(&format!("---\n{}\n---", text));
                push_truncation_note(&mut prompt, *truncated);
                None
            }
            ExtractionResult::Image(decoded) => {
                let default = format!(
                    "Describe this image ({}) and explain any code or diagrams it contains.",
                    self.file_name
                );
                match &self.instruction {
                    Some(instruction) => prompt.push_str(instruction),
                    None => prompt.push_str(&default),
                }
                Some(decoded.to_attachment())
            }
            ExtractionResult::Preview { text, truncated } => {
                let default = format!("Here is a preview of an uploaded file ({}):", self.file_name);
                self.push_instruction(&mut prompt, &default);
                prompt.push_str(&format!("```\n{}\n```", text));
                push_truncation_note(&mut prompt, *truncated);
                None
            }
            ExtractionResult::Unsupported { .. } => return None,
        };

        Some(Prompt {
            text: prompt,
            image,
        })
    }

    fn push_instruction(&self, prompt: &mut String, default: &str) {
        prompt.push_str(self.instruction.as_deref().unwrap_or(default));
        prompt.push('\n');
    }
}

fn push_truncation_note(prompt: &mut String, truncated: bool) {
    if truncated {
        prompt.push('\n');
        prompt.push_str(TRUNCATION_NOTE);
    }
}
