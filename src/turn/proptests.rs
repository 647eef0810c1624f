//! Property-based tests for the turn state machine
//!
//! These verify the stream-level invariants hold across arbitrary event
//! sequences, not just the scripted scenarios in the unit tests.

use super::accumulator::TurnAccumulator;
use super::fragment::{FragmentDescriptor, FragmentOp};
use crate::agent::events::ParsedEvent;
use proptest::prelude::*;
use serde_json::json;

// ============================================================================
// Arbitrary Generators
// ============================================================================

fn arb_chunk() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 .,$]{0,12}"
}

fn arb_tool_name() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("getSwap".to_string()),
        Just("getLatestPrice".to_string()),
        Just("getCryptoPriceHistory".to_string()),
        Just("someUnknownTool".to_string()),
    ]
}

fn arb_tool_output() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(r#"{"status":"ok"}"#.to_string()),
        Just("[1,2,3]".to_string()),
        Just("not-json".to_string()),
        Just(String::new()),
    ]
}

fn arb_event() -> impl Strategy<Value = ParsedEvent> {
    prop_oneof![
        Just(ParsedEvent::ModelStart),
        arb_chunk().prop_map(|chunk| ParsedEvent::ModelDelta { chunk }),
        proptest::option::of(arb_tool_name()).prop_map(|name| ParsedEvent::ModelEnd {
            name,
            output: None,
        }),
        arb_tool_name().prop_map(|name| ParsedEvent::ToolStart {
            name,
            input: json!({"ticker": "BTC"}),
        }),
        (arb_tool_name(), arb_tool_output())
            .prop_map(|(name, output)| ParsedEvent::ToolEnd { name, output }),
        Just(ParsedEvent::Ignored),
    ]
}

fn arb_events() -> impl Strategy<Value = Vec<ParsedEvent>> {
    proptest::collection::vec(arb_event(), 0..30)
}

fn arb_deltas() -> impl Strategy<Value = Vec<String>> {
    proptest::collection::vec(arb_chunk(), 0..20)
}

// ============================================================================
// Helpers
// ============================================================================

fn drive(events: &[ParsedEvent]) -> (String, Vec<FragmentOp>) {
    let mut acc = TurnAccumulator::new();
    let mut ops = Vec::new();
    for event in events {
        ops.extend(acc.apply(event));
    }
    let (text, tail) = acc.finish();
    ops.extend(tail);
    (text, ops)
}

/// Badge names appended to the stream, in emission order.
fn badge_names(ops: &[FragmentOp]) -> Vec<String> {
    ops.iter()
        .filter_map(|op| match op {
            FragmentOp::Append {
                fragment: FragmentDescriptor::ToolBadge { name, .. },
            } => Some(name.clone()),
            _ => None,
        })
        .collect()
}

// ============================================================================
// Properties
// ============================================================================

proptest! {
    /// Order preservation: tool badges appear in exactly the order their
    /// tool-start events arrived, and the stream always terminates with Done.
    #[test]
    fn prop_order_preservation(events in arb_events()) {
        let (_, ops) = drive(&events);

        let started: Vec<String> = events
            .iter()
            .filter_map(|e| match e {
                ParsedEvent::ToolStart { name, .. } => Some(name.clone()),
                _ => None,
            })
            .collect();

        prop_assert_eq!(badge_names(&ops), started);
        prop_assert_eq!(ops.last(), Some(&FragmentOp::Done));
        prop_assert_eq!(ops.iter().filter(|op| **op == FragmentOp::Done).count(), 1);
    }

    /// Update targeting: an update only ever arrives while the most recently
    /// appended fragment is still open, so the client can apply it blindly
    /// to the last open region.
    #[test]
    fn prop_updates_target_open_fragment(events in arb_events()) {
        let (_, ops) = drive(&events);

        let mut last_open = false;
        for op in &ops {
            match op {
                FragmentOp::Append { fragment } => last_open = fragment.is_open(),
                FragmentOp::Update { value } => {
                    prop_assert!(last_open, "update with no open fragment");
                    // A tool result closes the slot; further updates must not
                    // follow until a new fragment opens.
                    last_open = value.is_open();
                }
                FragmentOp::Done => {}
            }
        }
    }

    /// Full-value updates: every update of the streaming text region carries
    /// the entire accumulated text so far, which is a prefix of the final
    /// text, and consecutive updates only ever grow.
    #[test]
    fn prop_text_updates_are_accumulated_prefixes(deltas in arb_deltas()) {
        let mut events = vec![ParsedEvent::ModelStart];
        events.extend(
            deltas
                .iter()
                .map(|chunk| ParsedEvent::ModelDelta { chunk: chunk.clone() }),
        );
        events.push(ParsedEvent::ModelEnd { name: None, output: None });

        let (final_text, ops) = drive(&events);
        prop_assert_eq!(&final_text, &deltas.concat());

        let mut prev_len = 0usize;
        for op in &ops {
            if let FragmentOp::Update { value: FragmentDescriptor::Text { text } } = op {
                prop_assert!(final_text.starts_with(text.as_str()));
                prop_assert!(text.len() >= prev_len, "text region shrank");
                prev_len = text.len();
            }
        }
    }

    /// Malformed tolerance: ignored events are invisible to both
    /// projections wherever they land in the stream.
    #[test]
    fn prop_ignored_events_are_transparent(
        events in arb_events(),
        positions in proptest::collection::vec(any::<prop::sample::Index>(), 0..5),
    ) {
        let mut noisy = events.clone();
        for position in positions {
            let at = position.index(noisy.len() + 1);
            noisy.insert(at, ParsedEvent::Ignored);
        }
        prop_assert_eq!(drive(&noisy), drive(&events));
    }

    /// Transcript/UI coherence for pure text streams: the assistant text is
    /// exactly the concatenation of the closed text fragments' final values.
    #[test]
    fn prop_text_transcript_matches_fragments(segments in proptest::collection::vec(arb_deltas(), 0..4)) {
        let mut events = Vec::new();
        for deltas in &segments {
            events.push(ParsedEvent::ModelStart);
            events.extend(
                deltas
                    .iter()
                    .map(|chunk| ParsedEvent::ModelDelta { chunk: chunk.clone() }),
            );
            events.push(ParsedEvent::ModelEnd { name: None, output: None });
        }

        let (text, _) = drive(&events);
        let expected: String = segments.iter().map(|d| d.concat()).collect();
        prop_assert_eq!(text, expected);
    }

    /// The accumulator never panics, whatever the runtime throws at it.
    #[test]
    fn prop_no_panic_on_arbitrary_streams(events in arb_events()) {
        let _ = drive(&events);
    }
}
