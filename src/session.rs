//! Chat sessions and turn serialization
//!
//! Each session owns one `ConversationState` and a single-slot turn gate:
//! turns are strictly serialized, and a submit that arrives while a turn is
//! in flight is rejected rather than queued or raced. The gate, not a lock
//! around the store, is what guarantees the transcript is never appended
//! concurrently.

use crate::orchestrator::{TurnError, TurnOrchestrator};
use crate::transcript::{ConversationState, TranscriptEntry};
use crate::turn::FragmentOp;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;

/// Capacity of the per-turn fragment channel; a slow reader applies
/// backpressure to the orchestrator through it.
const FRAGMENT_CHANNEL_CAPACITY: usize = 32;

/// Errors from session operations
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session not found")]
    NotFound,

    #[error(transparent)]
    Turn(#[from] TurnError),
}

/// One live chat session
pub struct Session {
    pub state: Mutex<ConversationState>,
    turn_active: AtomicBool,
    cancel: Mutex<Option<CancellationToken>>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: Mutex::new(ConversationState::new()),
            turn_active: AtomicBool::new(false),
            cancel: Mutex::new(None),
        }
    }

    pub fn conversation_id(&self) -> String {
        self.lock_state().conversation_id.clone()
    }

    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.lock_state().snapshot()
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, ConversationState> {
        self.state
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Claim the single turn slot; fails if a turn is already in flight.
    fn begin_turn(self: &Arc<Self>) -> Result<TurnGuard, TurnError> {
        if self
            .turn_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(TurnError::TurnInProgress);
        }
        Ok(TurnGuard {
            session: self.clone(),
        })
    }

    /// Abort the in-flight turn, if any.
    pub fn cancel_turn(&self) -> bool {
        let cancel = self
            .cancel
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match cancel.as_ref() {
            Some(token) => {
                token.cancel();
                true
            }
            None => false,
        }
    }

    fn set_cancel(&self, token: Option<CancellationToken>) {
        *self
            .cancel
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = token;
    }
}

/// Releases the turn slot when the turn task finishes, however it finishes.
struct TurnGuard {
    session: Arc<Session>,
}

impl Drop for TurnGuard {
    fn drop(&mut self) {
        self.session.set_cancel(None);
        self.session.turn_active.store(false, Ordering::Release);
    }
}

/// Registry of live sessions and the entry point for submitting turns.
pub struct SessionManager {
    orchestrator: Arc<TurnOrchestrator>,
    sessions: RwLock<HashMap<String, Arc<Session>>>,
}

impl SessionManager {
    pub fn new(orchestrator: TurnOrchestrator) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Create a fresh session with an empty transcript.
    pub async fn create(&self) -> (String, Arc<Session>) {
        let session = Arc::new(Session::new());
        let id = session.conversation_id();
        self.sessions
            .write()
            .await
            .insert(id.clone(), session.clone());
        (id, session)
    }

    pub async fn get(&self, id: &str) -> Result<Arc<Session>, SessionError> {
        self.sessions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or(SessionError::NotFound)
    }

    /// Submit user input for one turn.
    ///
    /// Appends the user entry synchronously, then spawns the turn and hands
    /// back the read side of its fragment stream. Rejected with
    /// `TurnInProgress` if the session's turn slot is taken.
    pub async fn submit(
        &self,
        session_id: &str,
        text: String,
    ) -> Result<mpsc::Receiver<FragmentOp>, SessionError> {
        let session = self.get(session_id).await?;
        let guard = session.begin_turn()?;

        // The user entry lands before the runtime is ever called; it is not
        // rolled back if the turn later fails.
        session
            .lock_state()
            .append(TranscriptEntry::user(text))
            .map_err(TurnError::from)?;

        let cancel = CancellationToken::new();
        session.set_cancel(Some(cancel.clone()));

        let (ops_tx, ops_rx) = mpsc::channel(FRAGMENT_CHANNEL_CAPACITY);
        let orchestrator = self.orchestrator.clone();
        let conv_id = session_id.to_string();

        tokio::spawn(async move {
            let result = orchestrator
                .run_turn(&guard.session.state, &ops_tx, &cancel)
                .await;
            match result {
                Ok(()) => tracing::info!(session_id = %conv_id, "turn completed"),
                Err(TurnError::StreamAborted) => {
                    tracing::info!(session_id = %conv_id, "turn aborted");
                }
                Err(err) => tracing::error!(session_id = %conv_id, error = %err, "turn failed"),
            }
            drop(guard);
        });

        Ok(ops_rx)
    }
}
