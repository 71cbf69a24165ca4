//! Client-facing streaming events.
//!
//! `StreamEvent` is the wire protocol the gateway forwards over SSE and
//! WebSocket. Every request produces:
//! - exactly one `status` / `thinking` event first
//! - `status` / `reasoning` before each model call
//! - a `tool_start` / `tool_end` pair per tool call
//! - zero or more `text` events, and at least one before completion
//! - an `error` event if the request failed
//! - exactly one `status` / `complete` event last

use serde::{Deserialize, Serialize};

/// Loop lifecycle milestones carried by `status` events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusStep {
    Thinking,
    Reasoning,
    Complete,
}

/// One frame of the client streaming protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StreamEvent {
    Status { step: StatusStep, message: String },

    /// Assistant text: a streamed delta, a fallback answer or an apology.
    Text { content: String },

    ToolStart {
        tool: String,
        tool_display: String,
        input: serde_json::Value,
        message: String,
    },

    /// `output` is truncated for display.
    ToolEnd {
        tool: String,
        output: String,
        message: String,
    },

    Error { message: String },
}

impl StreamEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Text { .. } => "text",
            Self::ToolStart { .. } => "tool_start",
            Self::ToolEnd { .. } => "tool_end",
            Self::Error { .. } => "error",
        }
    }

    /// True only for the closing `status` / `complete` event.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            Self::Status {
                step: StatusStep::Complete,
                ..
            }
        )
    }
}
