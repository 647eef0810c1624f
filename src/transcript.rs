//! Conversation transcript types and the session-scoped state store
//!
//! The transcript is the single durable record of a conversation: an
//! append-only, ordered list of role-tagged entries. Its append order IS the
//! history sent to the agent runtime on the next turn, so entries are never
//! reordered, edited, or deduplicated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Who authored a transcript entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
    System,
    Tool,
}

/// Record of a tool invocation attached to an assistant entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallRecord {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// One immutable entry in the conversation transcript
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptEntry {
    pub id: String,
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCallRecord>,
    /// Tool name, present when `role` is `Tool`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TranscriptEntry {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            name: None,
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    #[allow(dead_code)] // Constructor for API completeness
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCallRecord>) -> Self {
        self.tool_calls = tool_calls;
        self
    }
}

/// Errors from transcript store operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TranscriptError {
    #[error("entry content must not be empty for role {0:?}")]
    EmptyContent(Role),
}

/// Ordered, session-scoped conversation state
///
/// Exactly one live instance per active chat session. Mutated only by
/// appending: a user entry when input is submitted, one assistant entry when
/// a turn completes. Turn serialization (see `session.rs`) guarantees no
/// concurrent appends.
#[derive(Debug, Clone, Serialize)]
pub struct ConversationState {
    pub conversation_id: String,
    messages: Vec<TranscriptEntry>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self {
            conversation_id: uuid::Uuid::new_v4().to_string(),
            messages: Vec::new(),
        }
    }

    /// Append an entry. User entries must carry text; assistant entries may
    /// be empty when every model segment was suppressed by the prose policy.
    pub fn append(&mut self, entry: TranscriptEntry) -> Result<(), TranscriptError> {
        if entry.role == Role::User && entry.content.is_empty() {
            return Err(TranscriptError::EmptyContent(entry.role));
        }
        self.messages.push(entry);
        Ok(())
    }

    /// Snapshot of the current transcript, in append order.
    ///
    /// Copy semantics: callers get owned entries and cannot mutate the store
    /// through the result.
    pub fn snapshot(&self) -> Vec<TranscriptEntry> {
        self.messages.clone()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}
