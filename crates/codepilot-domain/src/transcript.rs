//! Session transcript
//!
//! The transcript is ordered and append-only. When a preamble is configured
//! it occupies index 0 as a system turn and is excluded from
//! [`Transcript::visible_turns`].

use crate::turn::{ConversationTurn, Role};

/// Ordered list of conversation turns for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    preamble: Option<String>,
    turns: Vec<ConversationTurn>,
}

impl Transcript {
    /// Create a transcript, seeding it with the system preamble if given
    ///
    /// # Examples
    ///
    /// ```
    /// use codepilot_domain::Transcript;
    ///
    /// let mut transcript = Transcript::new(Some("Be brief.".to_string()));
    /// transcript.push_user("hello");
    /// assert_eq!(transcript.len(), 2);
    /// assert_eq!(transcript.visible_turns().len(), 1);
    /// ```
    pub fn new(preamble: Option<String>) -> Self {
        let mut transcript = Self {
            preamble,
            turns: Vec::new(),
        };
        transcript.reset();
        transcript
    }

    /// Append a turn at the end
    pub fn push(&mut self, turn: ConversationTurn) {
        self.turns.push(turn);
    }

    /// Append a user turn
    pub fn push_user(&mut self, content: impl Into<String>) {
        self.push(ConversationTurn::user(content));
    }

    /// Append an assistant turn
    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.push(ConversationTurn::assistant(content));
    }

    /// All turns, including the preamble
    pub fn turns(&self) -> &[ConversationTurn] {
        &self.turns
    }

    /// Turns shown to the user: everything after the preamble
    pub fn visible_turns(&self) -> &[ConversationTurn] {
        match self.turns.first() {
            Some(first) if self.preamble.is_some() && first.role == Role::System => &self.turns[1..],
            _ => &self.turns,
        }
    }

    /// The configured preamble, if any
    pub fn preamble(&self) -> Option<&str> {
        self.preamble.as_deref()
    }

    /// Most recent user turn
    pub fn last_user_turn(&self) -> Option<&ConversationTurn> {
        self.turns.iter().rev().find(|t| t.role == Role::User)
    }

    /// Most recent turn of any role
    pub fn last(&self) -> Option<&ConversationTurn> {
        self.turns.last()
    }

    /// Drop every turn except the preamble
    pub fn reset(&mut self) {
        self.turns.clear();
        if let Some(preamble) = &self.preamble {
            self.turns.push(ConversationTurn::system(preamble.clone()));
        }
    }

    /// Number of turns, including the preamble
    pub fn len(&self) -> usize {
        self.turns.len()
    }

    /// Whether the transcript holds no turns at all
    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new(None)
    }
}
