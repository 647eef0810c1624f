//! Mock agent runtime for testing
//!
//! Queues scripted event streams so orchestrator tests run without real I/O.

use super::{AgentRuntime, HistoryMessage, RuntimeError, RuntimeEvent, RuntimeEventStream};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::VecDeque;
use std::sync::Mutex;

type ScriptedTurn = Result<Vec<Result<RuntimeEvent, RuntimeError>>, RuntimeError>;

/// Agent runtime that replays queued event scripts
#[derive(Default)]
pub struct ScriptedRuntime {
    turns: Mutex<VecDeque<ScriptedTurn>>,
    /// Record of histories passed to `run`
    pub requests: Mutex<Vec<Vec<HistoryMessage>>>,
}

impl ScriptedRuntime {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a turn that streams the given events then ends cleanly.
    pub fn queue_events(&self, events: Vec<RuntimeEvent>) {
        self.turns
            .lock()
            .unwrap()
            .push_back(Ok(events.into_iter().map(Ok).collect()));
    }

    /// Queue a turn whose stream yields the given items verbatim.
    pub fn queue_items(&self, items: Vec<Result<RuntimeEvent, RuntimeError>>) {
        self.turns.lock().unwrap().push_back(Ok(items));
    }

    /// Queue a turn that fails before any event is produced.
    pub fn queue_unavailable(&self, message: impl Into<String>) {
        self.turns
            .lock()
            .unwrap()
            .push_back(Err(RuntimeError::Unavailable(message.into())));
    }

    pub fn recorded_requests(&self) -> Vec<Vec<HistoryMessage>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl AgentRuntime for ScriptedRuntime {
    async fn run(&self, history: Vec<HistoryMessage>) -> Result<RuntimeEventStream, RuntimeError> {
        self.requests.lock().unwrap().push(history);
        let turn = self
            .turns
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(RuntimeError::Unavailable("no scripted turn queued".into())));
        let items = turn?;
        Ok(Box::pin(futures::stream::iter(items)))
    }
}

// Event construction helpers shared by tests.

pub fn model_start() -> RuntimeEvent {
    wire("model-start", None, None)
}

pub fn model_delta(chunk: &str) -> RuntimeEvent {
    wire("model-delta", None, Some(json!({ "chunk": chunk })))
}

pub fn model_end(name: Option<&str>, output: Option<&str>) -> RuntimeEvent {
    wire(
        "model-end",
        name,
        output.map(|o| json!({ "output": o })),
    )
}

pub fn tool_start(name: &str, input: Value) -> RuntimeEvent {
    wire("tool-start", Some(name), Some(json!({ "input": input })))
}

pub fn tool_end(name: &str, output: &str) -> RuntimeEvent {
    wire("tool-end", Some(name), Some(json!({ "output": output })))
}

fn wire(kind: &str, name: Option<&str>, data: Option<Value>) -> RuntimeEvent {
    RuntimeEvent {
        event: kind.to_string(),
        name: name.map(String::from),
        data,
    }
}
