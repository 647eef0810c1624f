//! Runtime event taxonomy and parsing
//!
//! The agent-execution runtime emits a single ordered stream of
//! heterogeneous events. This module classifies each one into the closed
//! `ParsedEvent` union consumed by the turn accumulator. Classification is
//! pure; unknown kinds become `Ignored` so diagnostic events from newer
//! runtimes never fail a turn.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Raw event as received from the runtime, before classification
#[derive(Debug, Clone, Deserialize)]
pub struct RuntimeEvent {
    pub event: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: Option<Value>,
}

/// Classified runtime event
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedEvent {
    /// Model segment began
    ModelStart,
    /// Incremental text chunk for the current model segment
    ModelDelta { chunk: String },
    /// Model segment ended. `name` attributes the segment to a tool when the
    /// text was synthesized as a side effect of that tool's call; `output`
    /// carries the segment's final text when the runtime provides one.
    ModelEnd {
        name: Option<String>,
        output: Option<String>,
    },
    /// Tool invocation began
    ToolStart { name: String, input: Value },
    /// Tool invocation completed with its raw serialized output
    ToolEnd { name: String, output: String },
    /// Event kind not relevant to rendering; skipped without error
    Ignored,
}

/// Errors from event classification
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventError {
    #[error("malformed {kind} event: missing {field}")]
    Malformed {
        kind: String,
        field: &'static str,
    },
}

impl EventError {
    fn missing(kind: &str, field: &'static str) -> Self {
        EventError::Malformed {
            kind: kind.to_string(),
            field,
        }
    }
}

/// Classify one runtime event.
///
/// Fails only when a recognized kind is missing a required field; callers
/// log and skip such events without aborting the turn.
pub fn parse_event(event: &RuntimeEvent) -> Result<ParsedEvent, EventError> {
    let kind = event.event.as_str();
    match kind {
        "model-start" => Ok(ParsedEvent::ModelStart),

        // A delta without a chunk is a keepalive, not an error.
        "model-delta" => Ok(ParsedEvent::ModelDelta {
            chunk: data_str(event, "chunk").unwrap_or_default(),
        }),

        "model-end" => Ok(ParsedEvent::ModelEnd {
            name: event.name.clone(),
            output: data_str(event, "output"),
        }),

        "tool-start" => {
            let name = event
                .name
                .clone()
                .ok_or_else(|| EventError::missing(kind, "name"))?;
            let input = event
                .data
                .as_ref()
                .and_then(|d| d.get("input"))
                .cloned()
                .ok_or_else(|| EventError::missing(kind, "data.input"))?;
            Ok(ParsedEvent::ToolStart { name, input })
        }

        "tool-end" => {
            let name = event
                .name
                .clone()
                .ok_or_else(|| EventError::missing(kind, "name"))?;
            let output =
                data_str(event, "output").ok_or_else(|| EventError::missing(kind, "data.output"))?;
            Ok(ParsedEvent::ToolEnd { name, output })
        }

        _ => Ok(ParsedEvent::Ignored),
    }
}

/// Extract a string field from the event's data payload
fn data_str(event: &RuntimeEvent, field: &str) -> Option<String> {
    event
        .data
        .as_ref()
        .and_then(|d| d.get(field))
        .and_then(Value::as_str)
        .map(String::from)
}
