//! Conversation domain types.
//!
//! The conversation is the literal transcript resent to the model on every
//! turn: user prompt → model tool calls → tool observations → ... → answer.
//! It only grows at the back and only shrinks at the front.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tool::{ToolCall, ToolObservation};

/// Unique identifier for a conversation (one agent run).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(pub String);

impl ConversationId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for ConversationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single entry in the transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationEntry {
    /// Text from the end user
    User { text: String },

    /// Output of the model: final text, tool calls, or both
    Model {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        text: Option<String>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tool_calls: Vec<ToolCall>,
    },

    /// Result of executing one tool call
    Observation(ToolObservation),
}

impl ConversationEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self::User { text: text.into() }
    }

    pub fn model_text(text: impl Into<String>) -> Self {
        Self::Model {
            text: Some(text.into()),
            tool_calls: Vec::new(),
        }
    }

    pub fn model_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self::Model {
            text: None,
            tool_calls,
        }
    }
}

/// An ordered, front-evictable sequence of entries for one run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: ConversationId,
    entries: Vec<ConversationEntry>,
}

impl Conversation {
    /// Start a conversation with the initial user prompt.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            id: ConversationId::new(),
            entries: vec![ConversationEntry::user(prompt)],
        }
    }

    /// Append an entry at the back.
    pub fn push(&mut self, entry: ConversationEntry) {
        self.entries.push(entry);
    }

    /// Remove and return the oldest entry.
    pub fn evict_oldest(&mut self) -> Option<ConversationEntry> {
        if self.entries.is_empty() {
            None
        } else {
            Some(self.entries.remove(0))
        }
    }

    pub fn entries(&self) -> &[ConversationEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn last(&self) -> Option<&ConversationEntry> {
        self.entries.last()
    }
}
