//! UI-agnostic conversation types
//!
//! Shared between the session state machine, the gateway and whichever UI
//! renders the transcript.

use serde::{Deserialize, Serialize};

/// A message in the wizard conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub author: Author,
    pub text: String,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            author: Author::User,
            text: text.into(),
        }
    }

    pub fn agent(text: impl Into<String>) -> Self {
        Self {
            author: Author::Agent,
            text: text.into(),
        }
    }
}

/// Who wrote a chat message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Author {
    User,
    /// The "Aura" navigator persona played by the model
    Agent,
}

impl Author {
    /// Label used when a transcript is flattened into plain text
    pub fn as_str(&self) -> &'static str {
        match self {
            Author::User => "user",
            Author::Agent => "aura",
        }
    }

    /// Role name expected by the generation API
    pub fn api_role(&self) -> &'static str {
        match self {
            Author::User => "user",
            Author::Agent => "model",
        }
    }
}

/// Flatten a transcript into `author: text` lines
pub fn flatten_transcript(transcript: &[ChatMessage]) -> String {
    transcript
        .iter()
        .map(|m| format!("{}: {}", m.author.as_str(), m.text))
        .collect::<Vec<_>>()
        .join("\n")
}
