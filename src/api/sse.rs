//! Server-Sent Events translation of the fragment stream
//!
//! Each turn's fragment operations are delivered to the client as one SSE
//! response. The stream is half-duplex and single-reader; it ends after the
//! `done` event and is never restarted.

use crate::turn::FragmentOp;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::Stream;
use std::convert::Infallible;
use std::time::Duration;
use tokio_stream::wrappers::ReceiverStream;
use tokio_stream::StreamExt;

/// Convert a turn's fragment channel into an SSE response stream.
pub fn fragment_stream(
    ops_rx: tokio::sync::mpsc::Receiver<FragmentOp>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = ReceiverStream::new(ops_rx).map(|op| Ok(fragment_op_to_sse(op)));

    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

fn fragment_op_to_sse(op: FragmentOp) -> Event {
    let event_type = match &op {
        FragmentOp::Append { .. } => "append",
        FragmentOp::Update { .. } => "update",
        FragmentOp::Done => "done",
    };
    let data = serde_json::to_string(&op).unwrap_or_else(|_| "{}".to_string());
    Event::default().event(event_type).data(data)
}
