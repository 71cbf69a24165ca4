//! `oscopilot chat`: one-shot or interactive chat mode.

use anyhow::Context;
use oscopilot_agent::{Orchestrator, StreamEvent};
use oscopilot_config::AppConfig;
use oscopilot_core::request::{ChatRequest, HistoryRecord};
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

pub async fn run(config: AppConfig, message: Option<String>, repo: Option<String>) -> anyhow::Result<()> {
    if !config.has_api_key() {
        eprintln!();
        eprintln!("  No API key configured for provider '{}'.", config.default_provider);
        eprintln!("  Set OSCOPILOT_API_KEY or OPENAI_API_KEY, or add api_key to:");
        eprintln!("    {}", AppConfig::config_dir().join("config.toml").display());
        eprintln!();
    }

    let orchestrator = Arc::new(Orchestrator::from_config(&config).context("failed to build orchestrator")?);

    if let Some(msg) = message {
        let mut request = ChatRequest::new(msg);
        request.repo = repo;
        send(&orchestrator, &request).await?;
        return Ok(());
    }

    println!();
    println!("  OpenSource Copilot: interactive mode");
    println!("  Model: {}   Tools: {}", orchestrator.model(), orchestrator.tools().len());
    if let Some(repo) = &repo {
        println!("  Repo:  {repo}");
    }
    println!("  Type 'exit' or Ctrl+D to quit.");
    println!();

    let mut history: Vec<HistoryRecord> = Vec::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("  You > ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if matches!(line, "exit" | "quit") {
            break;
        }

        let mut request = ChatRequest::new(line).with_history(history.clone());
        request.repo = repo.clone();

        match send(&orchestrator, &request).await {
            Ok(answer) => {
                history.push(HistoryRecord::new("user", line));
                history.push(HistoryRecord::new("assistant", answer));
            }
            Err(e) => {
                tracing::warn!(error = %e, "Chat turn failed");
                eprintln!("  [Error] {e}");
            }
        }
    }

    println!("\n  Bye!\n");
    Ok(())
}

/// Stream one request to the terminal and return the assistant text.
async fn send(orchestrator: &Arc<Orchestrator>, request: &ChatRequest) -> anyhow::Result<String> {
    tracing::debug!(repo = ?request.repo(), history = request.history.len(), "Sending chat request");
    let mut events = orchestrator.run_stream(request)?;
    let mut answer = String::new();

    while let Some(event) = events.recv().await {
        if let StreamEvent::Text { content } = &event {
            answer.push_str(content);
            print!("{content}");
            std::io::stdout().flush()?;
        } else if let Some(line) = render(&event) {
            eprintln!("{line}");
        }
        if event.is_terminal() {
            println!();
        }
    }

    Ok(answer)
}

/// Progress line for non-text events.
fn render(event: &StreamEvent) -> Option<String> {
    match event {
        StreamEvent::Status { message, .. } => Some(format!("  · {message}")),
        StreamEvent::ToolStart { message, input, .. } => Some(format!("  {message} {input}")),
        StreamEvent::ToolEnd { message, .. } => Some(format!("  {message}")),
        StreamEvent::Error { message } => Some(format!("  ✗ {message}")),
        StreamEvent::Text { .. } => None,
    }
}
