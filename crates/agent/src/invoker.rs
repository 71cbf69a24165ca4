//! Tool Invocation Layer.
//!
//! Every requested call produces exactly one [`ToolInvocationResult`]. Tool
//! errors, malformed arguments, unknown names and panics all become failed
//! results; nothing here aborts the loop except cancellation.

use crate::event::{Emitter, LoopEvent};
use oscopilot_core::error::{Error, ToolError};
use oscopilot_core::message::MessageToolCall;
use oscopilot_core::tool::{ToolCall, ToolInvocationResult, ToolRegistry};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tracing::{debug, warn};

/// Runs tool calls against a shared registry, at most `max_concurrent`
/// at a time across every request using this invoker.
pub struct ToolInvoker {
    registry: Arc<ToolRegistry>,
    permits: Arc<Semaphore>,
}

impl ToolInvoker {
    pub fn new(registry: Arc<ToolRegistry>, max_concurrent: usize) -> Self {
        Self {
            registry,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Run one call to completion.
    pub async fn invoke(&self, call: &MessageToolCall) -> ToolInvocationResult {
        execute(self.registry.clone(), self.permits.clone(), call.clone()).await
    }

    /// Run a turn's calls concurrently and return results in call order.
    ///
    /// `ToolStarted` is emitted for every call before any result is
    /// awaited; `ToolFinished` follows in call order. If the consumer goes
    /// away, spawned calls keep running and their results are dropped.
    pub async fn dispatch(
        &self,
        calls: &[MessageToolCall],
        emitter: &Emitter,
    ) -> Result<Vec<ToolInvocationResult>, Error> {
        let mut handles = Vec::with_capacity(calls.len());
        for call in calls {
            emitter
                .emit(LoopEvent::ToolStarted {
                    call_id: call.id.clone(),
                    tool: call.name.clone(),
                    input: display_input(&call.arguments),
                })
                .await?;

            let task = execute(self.registry.clone(), self.permits.clone(), call.clone());
            handles.push((call, tokio::spawn(task)));
        }

        let mut results = Vec::with_capacity(handles.len());
        for (call, handle) in handles {
            let joined = tokio::select! {
                joined = handle => joined,
                _ = emitter.cancelled() => return Err(Error::Cancelled),
            };

            let result = joined.unwrap_or_else(|e| {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "Tool task aborted");
                let err = ToolError::ExecutionFailed {
                    tool_name: call.name.clone(),
                    reason: e.to_string(),
                };
                ToolInvocationResult::failure(&call.name, &call.id, err.to_string())
            });

            emitter.emit(LoopEvent::ToolFinished(result.clone())).await?;
            results.push(result);
        }
        Ok(results)
    }
}

/// Arguments as shown to clients: parsed JSON, or the raw text if it does
/// not parse.
fn display_input(arguments: &str) -> serde_json::Value {
    let raw = arguments.trim();
    if raw.is_empty() {
        return serde_json::json!({});
    }
    serde_json::from_str(raw).unwrap_or_else(|_| serde_json::Value::String(raw.to_string()))
}

async fn execute(
    registry: Arc<ToolRegistry>,
    permits: Arc<Semaphore>,
    call: MessageToolCall,
) -> ToolInvocationResult {
    let Some(tool) = registry.get(&call.name) else {
        warn!(tool = %call.name, call_id = %call.id, "Model requested an unknown tool");
        let err = ToolError::NotFound(call.name.clone());
        return ToolInvocationResult::failure(&call.name, &call.id, err.to_string());
    };

    let parsed = match ToolCall::from_message(&call) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(tool = %call.name, call_id = %call.id, error = %e, "Rejected tool arguments");
            return ToolInvocationResult::failure(&call.name, &call.id, e.to_string());
        }
    };

    let Ok(_permit) = permits.acquire_owned().await else {
        let err = ToolError::ExecutionFailed {
            tool_name: call.name.clone(),
            reason: "tool pool closed".into(),
        };
        return ToolInvocationResult::failure(&call.name, &call.id, err.to_string());
    };

    let start = Instant::now();
    let outcome = tool.execute(parsed.arguments).await;
    let duration_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(output) => {
            debug!(tool = %call.name, call_id = %call.id, duration_ms, bytes = output.len(), "Tool succeeded");
            ToolInvocationResult::success(&call.name, &call.id, output)
        }
        Err(e) => {
            warn!(tool = %call.name, call_id = %call.id, duration_ms, error = %e, "Tool execution failed");
            ToolInvocationResult::failure(&call.name, &call.id, e.to_string())
        }
    }
}
