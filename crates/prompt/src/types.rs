//! Conversation types.
//!
//! A conversation is an ordered `Vec<ConversationTurn>`, oldest first.
//! Turns are immutable once built; a new exchange is recorded by pushing
//! new turns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

impl Role {
    /// Parse a role from its exact wire name ("user", "assistant", "system").
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            "system" => Some(Self::System),
            _ => None,
        }
    }

    /// Wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
            Self::System => "system",
        }
    }

    /// Capitalized label used when rendering a conversation.
    pub fn label(&self) -> &'static str {
        match self {
            Self::User => "User",
            Self::Assistant => "Assistant",
            Self::System => "System",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One message in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationTurn {
    role: Role,
    text: String,
    timestamp: DateTime<Utc>,
}

impl ConversationTurn {
    pub fn new(role: Role, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp,
        }
    }

    /// A user turn stamped now.
    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Role::User, text, Utc::now())
    }

    /// An assistant turn stamped now.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(Role::Assistant, text, Utc::now())
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parsing() {
        assert_eq!(Role::parse("user"), Some(Role::User));
        assert_eq!(Role::parse("assistant"), Some(Role::Assistant));
        assert_eq!(Role::parse("system"), Some(Role::System));
        assert_eq!(Role::parse("USER"), None);
        assert_eq!(Role::parse(" assistant "), None);
        assert_eq!(Role::parse("tool"), None);
        assert_eq!(Role::parse(""), None);
    }

    #[test]
    fn test_role_labels() {
        assert_eq!(Role::User.label(), "User");
        assert_eq!(Role::Assistant.to_string(), "assistant");
    }

    #[test]
    fn test_turn_serialization() {
        let turn = ConversationTurn::user("How do I request leave?");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(json["role"], "user");
        assert_eq!(json["text"], "How do I request leave?");

        let back: ConversationTurn = serde_json::from_value(json).unwrap();
        assert_eq!(back, turn);
    }
}
