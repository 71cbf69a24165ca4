//! Turn a validated [`ChatRequest`] into the conversation the loop runs on.

use oscopilot_core::message::{Conversation, Message};
use oscopilot_core::request::ChatRequest;
use tracing::debug;

/// Prefix the message with the repository it concerns, unless the user
/// already named it.
pub fn annotate_repo(message: &str, repo: Option<&str>) -> String {
    match repo {
        Some(repo) if !message.contains(repo) => {
            format!("[当前分析仓库: {repo}]\n\n{message}")
        }
        _ => message.to_string(),
    }
}

/// Replayable history followed by the (annotated) new user message.
///
/// Only `user` and `assistant` records are kept; a `tool` record cannot be
/// replayed without the call that produced it.
pub fn normalize(request: &ChatRequest) -> Conversation {
    let mut conversation = Conversation::new();

    for (index, record) in request.history.iter().enumerate() {
        match record.role.as_str() {
            "user" => conversation.push(Message::user(&record.content)),
            "assistant" => conversation.push(Message::assistant(&record.content)),
            other => debug!(index, role = other, "Dropping history record"),
        }
    }

    conversation.push(Message::user(annotate_repo(&request.message, request.repo())));
    conversation
}
