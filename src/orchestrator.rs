//! Turn orchestration
//!
//! Drives one full turn: snapshot the transcript, call the agent runtime,
//! feed its event stream through the parser and accumulator, forward
//! fragment operations to the client channel, and finalize exactly one
//! assistant transcript entry on clean completion.

use crate::agent::{parse_event, AgentRuntime, HistoryMessage, RuntimeError};
use crate::transcript::{ConversationState, TranscriptEntry, TranscriptError};
use crate::turn::{FragmentDescriptor, FragmentOp, TurnAccumulator};
use futures::StreamExt;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Errors that end a turn
#[derive(Debug, Error)]
pub enum TurnError {
    /// A second submit arrived while a turn was in flight.
    #[error("a turn is already in progress for this session")]
    TurnInProgress,

    /// The client went away; partial work is discarded, nothing committed.
    #[error("turn aborted")]
    StreamAborted,

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    #[error(transparent)]
    Transcript(#[from] TranscriptError),
}

/// Drives turns against an agent runtime.
pub struct TurnOrchestrator {
    runtime: Arc<dyn AgentRuntime>,
}

impl TurnOrchestrator {
    pub fn new(runtime: Arc<dyn AgentRuntime>) -> Self {
        Self { runtime }
    }

    /// Run one turn to completion.
    ///
    /// The caller has already appended the user entry; this reads a snapshot,
    /// streams fragment operations into `ops_tx`, and appends exactly one
    /// assistant entry when the event stream ends cleanly. Turn-fatal
    /// failures append nothing: `RuntimeError::Unavailable` surfaces a single
    /// error fragment, cancellation and client disconnect discard the turn
    /// silently.
    pub async fn run_turn(
        &self,
        state: &Mutex<ConversationState>,
        ops_tx: &mpsc::Sender<FragmentOp>,
        cancel: &CancellationToken,
    ) -> Result<(), TurnError> {
        let history = {
            let state = state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            HistoryMessage::from_transcript(&state.snapshot())
        };

        let mut events = match self.runtime.run(history).await {
            Ok(stream) => stream,
            Err(err @ RuntimeError::Unavailable(_)) => {
                tracing::error!(error = %err, "agent runtime failed to start");
                send(ops_tx, FragmentOp::append(FragmentDescriptor::error(err.to_string()))).await?;
                send(ops_tx, FragmentOp::Done).await?;
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        };

        let mut accumulator = TurnAccumulator::new();

        loop {
            let item = tokio::select! {
                biased;
                () = cancel.cancelled() => {
                    tracing::info!("turn cancelled, discarding partial output");
                    return Err(TurnError::StreamAborted);
                }
                item = events.next() => item,
            };

            match item {
                Some(Ok(raw)) => match parse_event(&raw) {
                    Ok(parsed) => {
                        for op in accumulator.apply(&parsed) {
                            send(ops_tx, op).await?;
                        }
                    }
                    // Per-event errors never abort the turn.
                    Err(err) => tracing::warn!(error = %err, "skipping malformed runtime event"),
                },
                Some(Err(err @ RuntimeError::Malformed(_))) => {
                    tracing::warn!(error = %err, "skipping undecodable runtime event");
                }
                Some(Err(err)) => {
                    // Transport loss mid-stream: finalize with what arrived.
                    tracing::warn!(error = %err, "runtime stream interrupted, finalizing turn");
                    break;
                }
                None => break,
            }
        }

        let (assistant_text, tail) = accumulator.finish();

        {
            let mut state = state.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
            state.append(TranscriptEntry::assistant(assistant_text))?;
        }

        for op in tail {
            send(ops_tx, op).await?;
        }

        Ok(())
    }
}

/// Forward one operation; a closed channel means the client disconnected.
async fn send(tx: &mpsc::Sender<FragmentOp>, op: FragmentOp) -> Result<(), TurnError> {
    tx.send(op).await.map_err(|_| TurnError::StreamAborted)
}
