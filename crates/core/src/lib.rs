//! # OpenSource Copilot Core
//!
//! Domain types, traits, and error definitions for the tool-augmented chat
//! orchestrator. This crate has **zero framework dependencies**: it defines
//! the domain model that all other crates implement against.
//!
//! ## Design Philosophy
//!
//! The model backend and the tools are traits here. Implementations live in
//! their respective crates, so the control loop can be tested with scripted
//! providers and stub tools.

pub mod error;
pub mod message;
pub mod provider;
pub mod request;
pub mod tool;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ProviderError, RequestError, Result, ToolError};
pub use message::{Conversation, ConversationId, Message, MessageToolCall, Role};
pub use provider::{Provider, ProviderRequest, ProviderResponse, StreamChunk, ToolDefinition};
pub use request::{ChatRequest, HistoryRecord};
pub use tool::{Tool, ToolCall, ToolInvocationResult, ToolRegistry};
