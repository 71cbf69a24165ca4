//! The orchestrator core of OpenSource Copilot.
//!
//! A request flows through four stages:
//!
//! 1. **Normalize** client history and the new message into a conversation
//! 2. **Loop** between model calls and tool dispatch until the model answers
//! 3. **Invoke** requested tools concurrently, folding failures back in as data
//! 4. **Translate** loop events into the client [`StreamEvent`] protocol,
//!    synthesizing an answer from tool output when the model gave none
//!
//! The loop and the translator run as separate tasks joined by a bounded
//! channel, so a slow client slows the loop down instead of buffering.

pub mod event;
pub mod invoker;
pub mod normalize;
pub mod orchestrator;
pub mod prompt;
pub mod stream_event;
pub mod translator;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use event::{LoopEvent, StopReason};
pub use invoker::ToolInvoker;
pub use orchestrator::{ChatOutcome, LoopLimits, Orchestrator};
pub use prompt::{SYSTEM_PROMPT, display_name};
pub use stream_event::{StatusStep, StreamEvent};
pub use translator::{StreamTranslator, synthesize_fallback};
