//! Conversation turn types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Metadata;

/// Speaker of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "User"),
            Role::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One entry of the conversation history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub text: String,
    /// Metadata of the passages cited by an assistant turn, in context order
    pub sources: Vec<Metadata>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// A question asked by the user
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            sources: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// An answer with the sources it was conditioned on
    pub fn assistant(text: impl Into<String>, sources: Vec<Metadata>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            sources,
            created_at: Utc::now(),
        }
    }
}
