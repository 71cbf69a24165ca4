//! The Control Loop.
//!
//! One loop runs per request and owns that request's conversation:
//!
//! 1. **Normalize** the client request into a conversation
//! 2. **Model call** with the system prompt prepended and every tool declared
//! 3. **If tool calls**: dispatch them, append results in call order, go to 2
//! 4. **If text only**: done
//!
//! The loop also stops after `max_iterations` model calls, when the
//! request timeout expires, when the model backend fails, or when the
//! streaming client goes away.

use crate::event::{Emitter, LoopEvent, StopReason};
use crate::invoker::ToolInvoker;
use crate::normalize::normalize;
use crate::prompt::SYSTEM_PROMPT;
use crate::stream_event::StreamEvent;
use crate::translator::{self, synthesize_fallback};
use oscopilot_config::{AgentConfig, AppConfig};
use oscopilot_core::error::{Error, RequestError};
use oscopilot_core::message::{Conversation, Message, MessageToolCall};
use oscopilot_core::provider::{Provider, ProviderRequest, ToolDefinition};
use oscopilot_core::request::ChatRequest;
use oscopilot_core::tool::{ToolInvocationResult, ToolRegistry};
use oscopilot_tools::DataSources;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Per-request bounds, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopLimits {
    /// Model calls per request
    pub max_iterations: u32,

    /// Wall clock budget for the whole loop
    pub request_timeout: Duration,

    /// Tool calls in flight across all requests
    pub max_concurrent_tools: usize,

    /// Capacity of each event channel
    pub event_buffer: usize,
}

impl Default for LoopLimits {
    fn default() -> Self {
        Self::from(&AgentConfig::default())
    }
}

impl From<&AgentConfig> for LoopLimits {
    fn from(config: &AgentConfig) -> Self {
        Self {
            max_iterations: config.max_iterations.max(1),
            request_timeout: Duration::from_secs(config.request_timeout_secs.max(1)),
            max_concurrent_tools: config.max_concurrent_tools.max(1),
            event_buffer: config.event_buffer.max(1),
        }
    }
}

/// Result of a non-streaming request.
#[derive(Debug, Clone, Serialize)]
pub struct ChatOutcome {
    /// Final answer, or the fallback synthesized from tool results
    pub response: String,

    /// The transcript, without the system prompt
    pub messages: Vec<Message>,

    pub tool_results: Vec<ToolInvocationResult>,
    pub iterations: u32,
    pub stop_reason: StopReason,
}

enum Step {
    ModelCall,
    ToolDispatch(Vec<MessageToolCall>),
    Done(StopReason),
}

struct LoopOutput {
    text: String,
    tool_results: Vec<ToolInvocationResult>,
    iterations: u32,
    stop_reason: StopReason,
}

/// Immutable orchestrator shared by every request.
pub struct Orchestrator {
    provider: Arc<dyn Provider>,
    model: String,
    temperature: f32,
    max_tokens: Option<u32>,
    invoker: ToolInvoker,
    tool_definitions: Vec<ToolDefinition>,
    system_prompt: String,
    limits: LoopLimits,
}

impl Orchestrator {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>, tools: Arc<ToolRegistry>) -> Self {
        let limits = LoopLimits::default();
        Self {
            provider,
            model: model.into(),
            temperature: 0.7,
            max_tokens: None,
            tool_definitions: tools.definitions(),
            invoker: ToolInvoker::new(tools, limits.max_concurrent_tools),
            system_prompt: SYSTEM_PROMPT.to_string(),
            limits,
        }
    }

    /// Provider, tools and limits as configured.
    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::from_config_with_sources(config, DataSources::from_config(&config.data_sources))
    }

    /// Like [`Orchestrator::from_config`], with the tools reading from
    /// already-built clients.
    pub fn from_config_with_sources(config: &AppConfig, sources: DataSources) -> Result<Self, Error> {
        let provider = oscopilot_providers::build_from_config(config)?;
        let tools = Arc::new(oscopilot_tools::registry_with(sources));

        let mut orchestrator = Self::new(provider, oscopilot_providers::resolve_model(config), tools)
            .with_temperature(config.default_temperature)
            .with_max_tokens(config.default_max_tokens)
            .with_limits(LoopLimits::from(&config.agent));
        if let Some(prompt) = &config.agent.system_prompt_override {
            orchestrator = orchestrator.with_system_prompt(prompt);
        }
        Ok(orchestrator)
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = Some(max);
        self
    }

    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = prompt.into();
        self
    }

    pub fn with_limits(mut self, limits: LoopLimits) -> Self {
        self.invoker = ToolInvoker::new(self.invoker.registry().clone(), limits.max_concurrent_tools);
        self.limits = limits;
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn provider(&self) -> &Arc<dyn Provider> {
        &self.provider
    }

    pub fn tools(&self) -> &ToolRegistry {
        self.invoker.registry()
    }

    pub fn limits(&self) -> &LoopLimits {
        &self.limits
    }

    /// Answer a request without streaming.
    pub async fn run(&self, request: &ChatRequest) -> Result<ChatOutcome, Error> {
        request.validate()?;
        let mut conversation = normalize(request);
        info!(
            conversation_id = %conversation.id,
            history = request.history.len(),
            "Processing chat request"
        );

        let output = self
            .bounded(self.drive(&mut conversation, &Emitter::detached(), false))
            .await?;

        let response = synthesize_fallback(&output.text, &output.tool_results).unwrap_or(output.text);
        Ok(ChatOutcome {
            response,
            messages: conversation.messages,
            tool_results: output.tool_results,
            iterations: output.iterations,
            stop_reason: output.stop_reason,
        })
    }

    /// Answer a request as a stream of client events.
    ///
    /// Validation happens before anything is spawned, so a rejected request
    /// produces no events. Dropping the receiver cancels the request.
    pub fn run_stream(self: &Arc<Self>, request: &ChatRequest) -> Result<mpsc::Receiver<StreamEvent>, RequestError> {
        request.validate()?;
        let conversation = normalize(request);
        info!(
            conversation_id = %conversation.id,
            history = request.history.len(),
            "Streaming chat request"
        );

        let (loop_tx, loop_rx) = mpsc::channel(self.limits.event_buffer);
        let (client_tx, client_rx) = mpsc::channel(self.limits.event_buffer);

        let this = Arc::clone(self);
        tokio::spawn(async move { this.stream_loop(conversation, Emitter::new(loop_tx)).await });
        tokio::spawn(translator::pump(loop_rx, client_tx));
        Ok(client_rx)
    }

    async fn stream_loop(&self, mut conversation: Conversation, emitter: Emitter) {
        let outcome = self.bounded(self.drive(&mut conversation, &emitter, true)).await;
        let conversation_id = &conversation.id;

        match outcome {
            Ok(output) => {
                info!(
                    %conversation_id,
                    iterations = output.iterations,
                    tool_calls = output.tool_results.len(),
                    stop_reason = output.stop_reason.as_str(),
                    "Request complete"
                );
                let finished = LoopEvent::Finished {
                    stop_reason: output.stop_reason,
                };
                if let Err(e) = emitter.emit(finished).await {
                    debug!(%conversation_id, error = %e, "Terminal event not delivered, client gone");
                }
            }
            Err(Error::Cancelled) => {
                info!(%conversation_id, "Client disconnected, request cancelled");
            }
            Err(e) => {
                error!(%conversation_id, error = %e, "Request failed");
                if let Err(e) = emitter.emit(LoopEvent::Failed { message: e.to_string() }).await {
                    debug!(%conversation_id, error = %e, "Terminal event not delivered, client gone");
                }
            }
        }
    }

    async fn bounded<T>(&self, work: impl Future<Output = Result<T, Error>>) -> Result<T, Error> {
        let timeout = self.limits.request_timeout;
        tokio::time::timeout(timeout, work)
            .await
            .unwrap_or(Err(Error::Timeout {
                secs: timeout.as_secs(),
            }))
    }

    async fn drive(
        &self,
        conversation: &mut Conversation,
        emitter: &Emitter,
        streaming: bool,
    ) -> Result<LoopOutput, Error> {
        emitter.emit(LoopEvent::Started).await?;

        let mut text = String::new();
        let mut tool_results = Vec::new();
        let mut iterations = 0;
        let mut step = Step::ModelCall;

        loop {
            step = match step {
                Step::ModelCall if iterations >= self.limits.max_iterations => {
                    warn!(
                        conversation_id = %conversation.id,
                        iterations,
                        "Max iterations reached, answering from tool results"
                    );
                    Step::Done(StopReason::IterationLimit)
                }

                Step::ModelCall => {
                    iterations += 1;
                    debug!(conversation_id = %conversation.id, iteration = iterations, "Model call");
                    emitter
                        .emit(LoopEvent::ModelCallStarted { iteration: iterations })
                        .await?;

                    let reply = self.call_model(conversation, emitter, streaming).await?;
                    text.push_str(&reply.content);
                    let calls = reply.tool_calls.clone();
                    conversation.push(reply);

                    if calls.is_empty() {
                        Step::Done(StopReason::Answered)
                    } else {
                        Step::ToolDispatch(calls)
                    }
                }

                Step::ToolDispatch(calls) => {
                    debug!(
                        conversation_id = %conversation.id,
                        tool_count = calls.len(),
                        "Executing tool calls"
                    );
                    let results = self.invoker.dispatch(&calls, emitter).await?;
                    for result in &results {
                        conversation.push(Message::tool_result(&result.call_id, &result.output));
                    }
                    tool_results.extend(results);
                    Step::ModelCall
                }

                Step::Done(stop_reason) => {
                    return Ok(LoopOutput {
                        text,
                        tool_results,
                        iterations,
                        stop_reason,
                    });
                }
            };
        }
    }

    /// One model call. In streaming mode text deltas are emitted as they
    /// arrive; tool calls are taken from whichever chunks carry them.
    async fn call_model(
        &self,
        conversation: &Conversation,
        emitter: &Emitter,
        streaming: bool,
    ) -> Result<Message, Error> {
        let mut messages = Vec::with_capacity(conversation.messages.len() + 1);
        messages.push(Message::system(&self.system_prompt));
        messages.extend(conversation.messages.iter().cloned());

        let request = ProviderRequest {
            model: self.model.clone(),
            messages,
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            tools: self.tool_definitions.clone(),
            stream: streaming,
        };

        if !streaming {
            let response = tokio::select! {
                response = self.provider.complete(request) => response?,
                _ = emitter.cancelled() => return Err(Error::Cancelled),
            };
            return Ok(with_call_ids(response.message));
        }

        let mut chunks = tokio::select! {
            chunks = self.provider.stream(request) => chunks?,
            _ = emitter.cancelled() => return Err(Error::Cancelled),
        };

        let mut content = String::new();
        let mut tool_calls = Vec::new();
        loop {
            let chunk = tokio::select! {
                chunk = chunks.recv() => chunk,
                _ = emitter.cancelled() => return Err(Error::Cancelled),
            };
            let Some(chunk) = chunk else { break };
            let chunk = chunk?;

            if let Some(delta) = chunk.content.filter(|d| !d.is_empty()) {
                content.push_str(&delta);
                emitter.emit(LoopEvent::TextDelta(delta)).await?;
            }
            tool_calls.extend(chunk.tool_calls);
            if chunk.done {
                break;
            }
        }

        Ok(with_call_ids(Message::assistant_with_tools(content, tool_calls)))
    }
}

/// Give every tool call an id so each result can be matched to it.
fn with_call_ids(mut message: Message) -> Message {
    for call in &mut message.tool_calls {
        if call.id.trim().is_empty() {
            call.id = format!("call_{}", uuid::Uuid::new_v4().simple());
        }
    }
    message
}
