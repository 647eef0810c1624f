//! UI fragment descriptors and stream operations
//!
//! A fragment is one renderable unit of assistant output: a live text region
//! that grows while the model streams, or a terminal tool-result view. The
//! rendering layer consumes `FragmentOp`s in order and applies `Update` as a
//! full-value replace of the most recent open fragment, never as a diff.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One renderable unit of output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FragmentDescriptor {
    /// Live text region tied to one model segment
    Text { text: String },

    /// Placeholder shown while a tool call is in flight
    ToolBadge { name: String, arguments: Value },

    /// Token swap interface (replaces prose for swap requests)
    Swap { details: Value },

    /// Latest price snapshot for a ticker
    LatestPrice { data: Value },

    /// Historical price chart
    PriceHistory { points: Value },

    /// Financial statements view
    Financials { data: Value },

    /// News article carousel
    News { articles: Value },

    /// Generic structured-data view for unrecognized tools
    Json { name: String, data: Value },

    /// Raw-text fallback when a tool's output is not valid JSON
    RawText { name: String, text: String },

    /// Terminal error fragment for turn-fatal failures
    Error { message: String },
}

impl FragmentDescriptor {
    pub fn text(s: impl Into<String>) -> Self {
        FragmentDescriptor::Text { text: s.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        FragmentDescriptor::Error {
            message: message.into(),
        }
    }

    /// Whether this fragment may still receive `Update` operations.
    ///
    /// Only the streaming text region and the in-flight tool badge are open;
    /// everything else is terminal once appended.
    pub fn is_open(&self) -> bool {
        matches!(
            self,
            FragmentDescriptor::Text { .. } | FragmentDescriptor::ToolBadge { .. }
        )
    }
}

/// Operations on the per-turn fragment stream
///
/// The stream is append-only plus one extra operation: replace the value of
/// the most recent open fragment. `Done` is the terminal signal; a stream
/// serves exactly one turn and is never restarted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FragmentOp {
    Append { fragment: FragmentDescriptor },
    Update { value: FragmentDescriptor },
    Done,
}

impl FragmentOp {
    pub fn append(fragment: FragmentDescriptor) -> Self {
        FragmentOp::Append { fragment }
    }

    pub fn update(value: FragmentDescriptor) -> Self {
        FragmentOp::Update { value }
    }
}
