//! The inbound chat request schema.
//!
//! Clients send `{ message, repo?, history? }`. Shape errors are caught by
//! serde; `validate` enforces the remaining rules before anything runs.

use serde::{Deserialize, Serialize};
use crate::error::RequestError;

/// Longest accepted user message, in characters.
pub const MAX_MESSAGE_CHARS: usize = 16_000;

/// Most history records accepted per request.
pub const MAX_HISTORY: usize = 100;

/// One prior turn supplied by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub role: String,

    #[serde(default)]
    pub content: String,
}

impl HistoryRecord {
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
        }
    }
}

/// A chat request as received from a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,

    /// Repository the user is asking about, as `owner/name`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,

    #[serde(default)]
    pub history: Vec<HistoryRecord>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            repo: None,
            history: Vec::new(),
        }
    }

    pub fn with_repo(mut self, repo: impl Into<String>) -> Self {
        self.repo = Some(repo.into());
        self
    }

    pub fn with_history(mut self, history: Vec<HistoryRecord>) -> Self {
        self.history = history;
        self
    }

    /// The repo context, ignoring blank strings.
    pub fn repo(&self) -> Option<&str> {
        self.repo.as_deref().map(str::trim).filter(|r| !r.is_empty())
    }

    /// Reject input the orchestrator must never see.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.message.trim().is_empty() {
            return Err(RequestError::EmptyMessage);
        }

        let len = self.message.chars().count();
        if len > MAX_MESSAGE_CHARS {
            return Err(RequestError::MessageTooLong { len, max: MAX_MESSAGE_CHARS });
        }

        if self.history.len() > MAX_HISTORY {
            return Err(RequestError::HistoryTooLong {
                len: self.history.len(),
                max: MAX_HISTORY,
            });
        }

        if let Some(repo) = self.repo() {
            if !is_repo_slug(repo) {
                return Err(RequestError::InvalidRepo(repo.to_string()));
            }
        }

        Ok(())
    }
}

/// `owner/name` with both halves non-empty and no whitespace.
pub fn is_repo_slug(value: &str) -> bool {
    let mut parts = value.split('/');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(owner), Some(name), None) => {
            !owner.is_empty()
                && !name.is_empty()
                && !value.chars().any(char::is_whitespace)
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_request_deserializes() {
        let req: ChatRequest = serde_json::from_str(r#"{"message":"分析 apache/dubbo"}"#).unwrap();
        assert_eq!(req.message, "分析 apache/dubbo");
        assert!(req.repo.is_none());
        assert!(req.history.is_empty());
        assert!(req.validate().is_ok());
    }

    #[test]
    fn missing_message_is_a_shape_error() {
        let result: Result<ChatRequest, _> = serde_json::from_str(r#"{"repo":"apache/dubbo"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn history_record_without_content_defaults_to_empty() {
        let req: ChatRequest =
            serde_json::from_str(r#"{"message":"hi","history":[{"role":"user"}]}"#).unwrap();
        assert_eq!(req.history[0].content, "");
    }

    #[test]
    fn blank_message_rejected() {
        assert_eq!(ChatRequest::new("   ").validate(), Err(RequestError::EmptyMessage));
    }

    #[test]
    fn oversized_message_rejected() {
        let req = ChatRequest::new("a".repeat(MAX_MESSAGE_CHARS + 1));
        assert!(matches!(req.validate(), Err(RequestError::MessageTooLong { .. })));
    }

    #[test]
    fn oversized_history_rejected() {
        let history = vec![HistoryRecord::new("user", "x"); MAX_HISTORY + 1];
        let req = ChatRequest::new("hi").with_history(history);
        assert!(matches!(req.validate(), Err(RequestError::HistoryTooLong { .. })));
    }

    #[test]
    fn repo_must_be_a_slug() {
        assert!(ChatRequest::new("hi").with_repo("apache/dubbo").validate().is_ok());
        assert!(ChatRequest::new("hi").with_repo("").validate().is_ok());
        for bad in ["apache", "apache/", "/dubbo", "a/b/c", "apache/ dubbo"] {
            assert!(
                matches!(ChatRequest::new("hi").with_repo(bad).validate(), Err(RequestError::InvalidRepo(_))),
                "{bad} should be rejected"
            );
        }
    }
}
