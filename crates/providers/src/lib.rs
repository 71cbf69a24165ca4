//! LLM Provider implementations for OpenSource Copilot.
//!
//! All providers implement the `oscopilot_core::Provider` trait.
//! `build_from_config` picks the backend named in the configuration.

pub mod openai_compat;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use router::{build_from_config, resolve_model};
