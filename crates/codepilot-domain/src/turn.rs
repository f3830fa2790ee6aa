//! Conversation turns

use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The person at the keyboard
    User,

    /// The model's reply (or an error/warning standing in for one)
    Assistant,

    /// Fixed instruction preamble; never rendered as a visible turn
    System,
}

impl Role {
    /// Wire name used by chat-completion style APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        }
    }

    /// Parse a role from its wire name
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "user" => Some(Role::User),
            "assistant" => Some(Role::Assistant),
            "system" => Some(Role::System),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationTurn {
    /// Author of the turn
    pub role: Role,

    /// Message text
    pub content: String,
}

impl ConversationTurn {
    /// Create a turn with an explicit role
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user turn
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Create a system turn
    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_round_trip() {
        for role in [Role::User, Role::Assistant, Role::System] {
            assert_eq!(Role::parse(role.as_str()), Some(role));
        }
        assert_eq!(Role::parse("ASSISTANT"), Some(Role::Assistant));
        assert_eq!(Role::parse("tool"), None);
    }

    #[test]
    fn test_roles_serialize_lowercase() {
        let turn = ConversationTurn::assistant("done");
        let json = serde_json::to_string(&turn).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"done"}"#);

        let parsed: ConversationTurn = serde_json::from_str(r#"{"role":"system","content":"be brief"}"#).unwrap();
        assert_eq!(parsed, ConversationTurn::system("be brief"));
        assert!(serde_json::from_str::<Role>(r#""User""#).is_err());
    }

    #[test]
    fn test_turn_constructors() {
        let turn = ConversationTurn::user("hi");
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "hi");
        assert_eq!(ConversationTurn::system("x").role, Role::System);
        assert_eq!(ConversationTurn::assistant("y").role.to_string(), "assistant");
    }
}
