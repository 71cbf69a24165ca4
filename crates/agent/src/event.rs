//! Internal events produced by the control loop.

use oscopilot_core::error::Error;
use oscopilot_core::tool::ToolInvocationResult;
use serde::Serialize;
use tokio::sync::mpsc;

/// Why the loop stopped without failing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// The model replied without requesting tools.
    Answered,
    /// `max_iterations` model calls were made and the last one still asked
    /// for tools.
    IterationLimit,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Answered => "answered",
            Self::IterationLimit => "iteration_limit",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoopEvent {
    Started,
    ModelCallStarted { iteration: u32 },
    TextDelta(String),
    ToolStarted {
        call_id: String,
        tool: String,
        input: serde_json::Value,
    },
    ToolFinished(ToolInvocationResult),
    Failed { message: String },
    Finished { stop_reason: StopReason },
}

/// Sending side of the loop's event channel.
///
/// A detached emitter (used by the non-streaming path) drops every event
/// and is never cancelled.
#[derive(Clone)]
pub struct Emitter {
    tx: Option<mpsc::Sender<LoopEvent>>,
}

impl Emitter {
    pub fn new(tx: mpsc::Sender<LoopEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    pub fn detached() -> Self {
        Self { tx: None }
    }

    /// Blocks while the channel is full. Fails once the consumer is gone.
    pub async fn emit(&self, event: LoopEvent) -> Result<(), Error> {
        match &self.tx {
            Some(tx) => tx.send(event).await.map_err(|_| Error::Cancelled),
            None => Ok(()),
        }
    }

    /// Resolves when the consumer has dropped its receiver.
    pub async fn cancelled(&self) {
        match &self.tx {
            Some(tx) => tx.closed().await,
            None => std::future::pending().await,
        }
    }
}
