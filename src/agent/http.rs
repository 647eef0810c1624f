//! HTTP adapter for the agent-execution runtime
//!
//! Posts the conversation history and reads back a newline-delimited JSON
//! stream of runtime events. A failure before the first byte is turn-fatal;
//! an undecodable line is skipped downstream like any malformed event.

use super::{AgentRuntime, HistoryMessage, RuntimeError, RuntimeEvent, RuntimeEventStream};
use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use serde_json::json;
use tokio_util::codec::{FramedRead, LinesCodec};
use tokio_util::io::StreamReader;

/// Agent runtime reached over HTTP
pub struct HttpAgentRuntime {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpAgentRuntime {
    pub fn new(client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
        }
    }
}

#[async_trait]
impl AgentRuntime for HttpAgentRuntime {
    async fn run(&self, history: Vec<HistoryMessage>) -> Result<RuntimeEventStream, RuntimeError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "messages": history }))
            .send()
            .await
            .map_err(|e| RuntimeError::Unavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RuntimeError::Unavailable(format!(
                "runtime returned {status}"
            )));
        }

        let bytes = response
            .bytes_stream()
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e));
        let lines = FramedRead::new(StreamReader::new(bytes), LinesCodec::new());

        let events = lines.filter_map(|line| async move {
            match line {
                Ok(line) if line.trim().is_empty() => None,
                Ok(line) => Some(
                    serde_json::from_str::<RuntimeEvent>(&line)
                        .map_err(|e| RuntimeError::Malformed(e.to_string())),
                ),
                Err(e) => Some(Err(RuntimeError::Transport(e.to_string()))),
            }
        });

        Ok(Box::pin(events))
    }
}
