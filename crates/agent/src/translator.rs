//! Streaming Event Translator.
//!
//! [`StreamTranslator`] maps the loop's [`LoopEvent`]s onto client
//! [`StreamEvent`]s. It remembers the text emitted so far and every tool
//! result so that a request which produced no answer text still ends with
//! one, synthesized from the tool outputs.

use crate::event::LoopEvent;
use crate::prompt::display_name;
use crate::stream_event::{StatusStep, StreamEvent};
use oscopilot_core::tool::ToolInvocationResult;
use oscopilot_tools::analysis::report::{DIAGNOSIS_REPORT_MARKER, HEALTH_REPORT_MARKER};
use tokio::sync::mpsc;
use tracing::debug;

/// Longest tool output forwarded in a `tool_end` event, in characters.
pub const MAX_TOOL_OUTPUT_CHARS: usize = 500;

pub const ONBOARDING_MESSAGE: &str = "你好！我是 OpenSource Copilot，一个开源社区智能运营助手。请告诉我你想分析哪个开源项目，例如：\"分析 apache/dubbo 的健康状况\"";

const THINKING: &str = "🤔 正在思考...";
const REASONING: &str = "💭 正在推理...";
const COMPLETE: &str = "✨ 处理完成";
const TOOL_DONE: &str = "✅ 工具调用完成";

/// Cut `text` to `max` characters, marking the cut with `...`.
pub fn truncate_output(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}

/// The final answer to show when the loop ended without text.
///
/// Returns `None` when the model did produce text. Otherwise the first
/// rich report among `results` wins; failing that, every output joined by
/// blank lines; with no results at all, the onboarding message.
pub fn synthesize_fallback(text: &str, results: &[ToolInvocationResult]) -> Option<String> {
    if !text.trim().is_empty() {
        return None;
    }

    if results.is_empty() {
        return Some(ONBOARDING_MESSAGE.to_string());
    }

    let report = results.iter().find(|r| {
        r.output.contains(HEALTH_REPORT_MARKER) || r.output.contains(DIAGNOSIS_REPORT_MARKER)
    });
    if let Some(report) = report {
        return Some(report.output.clone());
    }

    let outputs: Vec<&str> = results.iter().map(|r| r.output.as_str()).collect();
    Some(outputs.join("\n\n"))
}

/// The apology shown after an unrecoverable failure.
pub fn apology(error: &str) -> String {
    format!("抱歉，处理您的请求时发生了错误：{error}\n\n请尝试重新提问，例如：\"分析 apache/dubbo\"")
}

/// Either `Failed` or `Finished` ends a request; both close the stream with
/// `status` / `complete`.
#[derive(Debug, Default)]
pub struct StreamTranslator {
    text: String,
    results: Vec<ToolInvocationResult>,
}

impl StreamTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_event(&mut self, event: LoopEvent) -> Vec<StreamEvent> {
        match event {
            LoopEvent::Started => vec![status(StatusStep::Thinking, THINKING)],

            LoopEvent::ModelCallStarted { .. } => vec![status(StatusStep::Reasoning, REASONING)],

            LoopEvent::TextDelta(delta) if delta.is_empty() => vec![],
            LoopEvent::TextDelta(delta) => {
                self.text.push_str(&delta);
                vec![StreamEvent::Text { content: delta }]
            }

            LoopEvent::ToolStarted { tool, input, .. } => {
                let display = display_name(&tool).to_string();
                vec![StreamEvent::ToolStart {
                    message: format!("🔧 正在调用工具: {display}"),
                    tool,
                    tool_display: display,
                    input,
                }]
            }

            LoopEvent::ToolFinished(result) => {
                let event = StreamEvent::ToolEnd {
                    tool: result.tool_name.clone(),
                    output: truncate_output(&result.output, MAX_TOOL_OUTPUT_CHARS),
                    message: TOOL_DONE.to_string(),
                };
                self.results.push(result);
                vec![event]
            }

            LoopEvent::Failed { message } => vec![
                StreamEvent::Error {
                    message: format!("处理时发生错误: {message}"),
                },
                StreamEvent::Text {
                    content: apology(&message),
                },
                status(StatusStep::Complete, COMPLETE),
            ],

            LoopEvent::Finished { stop_reason } => {
                let mut events = Vec::with_capacity(2);
                if let Some(content) = synthesize_fallback(&self.text, &self.results) {
                    debug!(stop_reason = stop_reason.as_str(), tool_results = self.results.len(), "Emitting fallback answer");
                    events.push(StreamEvent::Text { content });
                }
                events.push(status(StatusStep::Complete, COMPLETE));
                events
            }
        }
    }
}

fn status(step: StatusStep, message: &str) -> StreamEvent {
    StreamEvent::Status {
        step,
        message: message.to_string(),
    }
}

/// Forward translated events until the loop finishes or the client leaves.
///
/// Dropping `events` on exit is what tells the loop to stop.
pub async fn pump(mut events: mpsc::Receiver<LoopEvent>, client: mpsc::Sender<StreamEvent>) {
    let mut translator = StreamTranslator::new();
    loop {
        let event = tokio::select! {
            event = events.recv() => event,
            _ = client.closed() => {
                debug!("Client disconnected, abandoning stream");
                return;
            }
        };
        let Some(event) = event else {
            return;
        };

        let finished = matches!(event, LoopEvent::Finished { .. } | LoopEvent::Failed { .. });
        for out in translator.on_event(event) {
            if client.send(out).await.is_err() {
                return;
            }
        }
        if finished {
            return;
        }
    }
}
