//! Per-turn accumulation state machine
//!
//! Consumes classified runtime events and derives two projections that must
//! never diverge: the ordered fragment operations shown to the client, and
//! the assistant-text buffer that becomes the turn's transcript entry.
//!
//! The transition function is pure: given the same phase and event it always
//! produces the same result, with no I/O. `TurnAccumulator` is the thin
//! stateful shell that owns the phase and the assistant-text buffer.

use crate::agent::events::ParsedEvent;
use crate::render::{render_tool_result, suppresses_prose};
use crate::turn::fragment::{FragmentDescriptor, FragmentOp};

/// Phase of the turn state machine
#[derive(Debug, Clone, PartialEq, Default)]
pub enum TurnPhase {
    /// No fragment open; ready for text or a tool call
    #[default]
    Idle,

    /// A text fragment is open and holds the accumulated segment text
    TextOpen { text: String },

    /// A tool badge is the most recent fragment, awaiting the tool's result
    ToolPending { name: String },
}

/// Result of applying one event to a phase
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub next: TurnPhase,
    pub ops: Vec<FragmentOp>,
    /// Text to append to the turn's assistant transcript buffer
    pub transcript_append: Option<String>,
}

impl Transition {
    fn stay(phase: &TurnPhase) -> Self {
        Self {
            next: phase.clone(),
            ops: vec![],
            transcript_append: None,
        }
    }

    fn to(next: TurnPhase) -> Self {
        Self {
            next,
            ops: vec![],
            transcript_append: None,
        }
    }

    fn with_op(mut self, op: FragmentOp) -> Self {
        self.ops.push(op);
        self
    }

    fn with_transcript(mut self, text: String) -> Self {
        self.transcript_append = Some(text);
        self
    }
}

/// Pure transition function for the turn state machine.
pub fn transition(phase: &TurnPhase, event: &ParsedEvent) -> Transition {
    match (phase, event) {
        // ============================================================
        // Model text streaming
        // ============================================================

        // Opening a text fragment: the fragment is appended empty so the
        // client has a region to bind before the first chunk lands.
        (TurnPhase::Idle, ParsedEvent::ModelStart) => {
            Transition::to(TurnPhase::TextOpen {
                text: String::new(),
            })
            .with_op(FragmentOp::append(FragmentDescriptor::text("")))
        }

        (TurnPhase::Idle, ParsedEvent::ModelDelta { chunk }) => {
            let mut t = Transition::to(TurnPhase::TextOpen {
                text: chunk.clone(),
            })
            .with_op(FragmentOp::append(FragmentDescriptor::text("")));
            if !chunk.is_empty() {
                t = t.with_op(FragmentOp::update(FragmentDescriptor::text(chunk.clone())));
            }
            t
        }

        // Already streaming; a second start marker is redundant.
        (TurnPhase::TextOpen { .. }, ParsedEvent::ModelStart) => Transition::stay(phase),

        // Updates carry the full accumulated text, never a patch, so the
        // client can always render the latest value of the open fragment.
        (TurnPhase::TextOpen { text }, ParsedEvent::ModelDelta { chunk }) => {
            if chunk.is_empty() {
                return Transition::stay(phase);
            }
            let full = format!("{text}{chunk}");
            Transition::to(TurnPhase::TextOpen { text: full.clone() })
                .with_op(FragmentOp::update(FragmentDescriptor::text(full)))
        }

        // Segment close. The runtime may supply a final output that extends
        // what was streamed; the fragment is brought up to it so the visible
        // view and the transcript stay two projections of the same stream.
        (TurnPhase::TextOpen { text }, ParsedEvent::ModelEnd { name, output }) => {
            let segment = output.clone().unwrap_or_else(|| text.clone());
            let mut t = Transition::to(TurnPhase::Idle);
            if segment != *text {
                t = t.with_op(FragmentOp::update(FragmentDescriptor::text(segment.clone())));
            }
            let suppressed = name.as_deref().is_some_and(suppresses_prose);
            if !suppressed {
                t = t.with_transcript(segment);
            }
            t
        }

        // Segment close with nothing open: nothing was streamed, nothing to
        // record.
        (TurnPhase::Idle | TurnPhase::ToolPending { .. }, ParsedEvent::ModelEnd { .. }) => {
            Transition::stay(phase)
        }

        // ============================================================
        // Tool invocations
        // ============================================================

        // A tool call permanently closes the open text fragment. Its text
        // goes to the transcript now because no model-end will arrive for a
        // fragment that is already closed.
        (TurnPhase::TextOpen { text }, ParsedEvent::ToolStart { name, input }) => {
            Transition::to(TurnPhase::ToolPending { name: name.clone() })
                .with_op(FragmentOp::append(FragmentDescriptor::ToolBadge {
                    name: name.clone(),
                    arguments: input.clone(),
                }))
                .with_transcript(text.clone())
        }

        (TurnPhase::Idle, ParsedEvent::ToolStart { name, input }) => {
            Transition::to(TurnPhase::ToolPending { name: name.clone() })
                .with_op(FragmentOp::append(FragmentDescriptor::ToolBadge {
                    name: name.clone(),
                    arguments: input.clone(),
                }))
        }

        // Back-to-back tool calls: the first badge is abandoned where it
        // stands and a new one opens.
        (TurnPhase::ToolPending { .. }, ParsedEvent::ToolStart { name, input }) => {
            Transition::to(TurnPhase::ToolPending { name: name.clone() })
                .with_op(FragmentOp::append(FragmentDescriptor::ToolBadge {
                    name: name.clone(),
                    arguments: input.clone(),
                }))
        }

        // Tool completion replaces the badge with the rendered result. The
        // raw output is appended to the transcript verbatim either way; a
        // parse failure only degrades the fragment to the raw-text view.
        (TurnPhase::ToolPending { .. }, ParsedEvent::ToolEnd { name, output }) => {
            Transition::to(TurnPhase::Idle)
                .with_op(FragmentOp::update(resolve_tool_fragment(name, output)))
                .with_transcript(output.clone())
        }

        // Tool completion without a preceding start: render it as a fresh
        // fragment rather than dropping the result.
        (TurnPhase::Idle, ParsedEvent::ToolEnd { name, output }) => Transition::to(TurnPhase::Idle)
            .with_op(FragmentOp::append(resolve_tool_fragment(name, output)))
            .with_transcript(output.clone()),

        (TurnPhase::TextOpen { text }, ParsedEvent::ToolEnd { name, output }) => {
            Transition::to(TurnPhase::Idle)
                .with_op(FragmentOp::append(resolve_tool_fragment(name, output)))
                .with_transcript(format!("{text}{output}"))
        }

        // Text streamed while a tool is pending would steal the badge's
        // update slot; the runtime does not interleave these, so drop it.
        (
            TurnPhase::ToolPending { .. },
            ParsedEvent::ModelStart | ParsedEvent::ModelDelta { .. },
        ) => Transition::stay(phase),

        (_, ParsedEvent::Ignored) => Transition::stay(phase),
    }
}

/// Parse a tool's raw output and render it, falling back to the raw-text
/// view when the output is not valid JSON.
fn resolve_tool_fragment(name: &str, output: &str) -> FragmentDescriptor {
    match serde_json::from_str::<serde_json::Value>(output) {
        Ok(value) => render_tool_result(name, &value),
        Err(err) => {
            tracing::warn!(tool = %name, error = %err, "tool output is not valid JSON");
            FragmentDescriptor::RawText {
                name: name.to_string(),
                text: output.to_string(),
            }
        }
    }
}

/// Stateful shell around the pure transition function.
///
/// Owns the phase and the assistant-text buffer for one turn. A fresh
/// accumulator serves exactly one turn.
#[derive(Debug, Default)]
pub struct TurnAccumulator {
    phase: TurnPhase,
    assistant_text: String,
}

impl TurnAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one event, returning the fragment operations to emit.
    pub fn apply(&mut self, event: &ParsedEvent) -> Vec<FragmentOp> {
        let result = transition(&self.phase, event);
        self.phase = result.next;
        if let Some(text) = result.transcript_append {
            self.assistant_text.push_str(&text);
        }
        result.ops
    }

    /// Finalize the turn at end-of-stream: close any open fragment and
    /// produce the assistant transcript text plus the terminal operations.
    pub fn finish(mut self) -> (String, Vec<FragmentOp>) {
        if let TurnPhase::TextOpen { text } = &self.phase {
            self.assistant_text.push_str(text);
        }
        (self.assistant_text, vec![FragmentOp::Done])
    }

    #[cfg(test)]
    pub fn phase(&self) -> &TurnPhase {
        &self.phase
    }
}
