//! Agent-execution runtime seam
//!
//! The runtime that decides what to say and which tools to call is an
//! external collaborator. This module defines the trait the orchestrator
//! consumes, the event taxonomy it receives, and the HTTP adapter used in
//! production.

pub mod events;
pub mod http;

#[cfg(test)]
pub mod testing;

pub use events::{parse_event, EventError, ParsedEvent, RuntimeEvent};
pub use http::HttpAgentRuntime;

use crate::transcript::{Role, TranscriptEntry};
use async_trait::async_trait;
use futures::Stream;
use serde::Serialize;
use std::pin::Pin;
use thiserror::Error;

/// Ordered stream of runtime events for one turn
pub type RuntimeEventStream = Pin<Box<dyn Stream<Item = Result<RuntimeEvent, RuntimeError>> + Send>>;

/// Errors from the agent runtime
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// The runtime call could not start; turn-fatal.
    #[error("agent runtime unavailable: {0}")]
    Unavailable(String),

    /// One stream item could not be decoded; skipped like any malformed
    /// event.
    #[error("undecodable runtime event: {0}")]
    Malformed(String),

    /// Transport failed mid-stream; the turn finalizes with what arrived.
    #[error("runtime transport error: {0}")]
    Transport(String),
}

/// One message of conversation history sent to the runtime
#[derive(Debug, Clone, Serialize)]
pub struct HistoryMessage {
    pub role: Role,
    pub content: String,
}

impl HistoryMessage {
    /// Project a transcript snapshot into runtime call input.
    pub fn from_transcript(entries: &[TranscriptEntry]) -> Vec<Self> {
        entries
            .iter()
            .map(|e| Self {
                role: e.role,
                content: e.content.clone(),
            })
            .collect()
    }
}

/// Capability to run one agent turn over a conversation history.
///
/// The orchestrator treats this as opaque: it never inspects or alters the
/// runtime's tool-selection decisions, it only consumes the event stream.
#[async_trait]
pub trait AgentRuntime: Send + Sync {
    async fn run(&self, history: Vec<HistoryMessage>) -> Result<RuntimeEventStream, RuntimeError>;
}
