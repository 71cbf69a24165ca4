//! Mock provider, tool and upstream data server for gateway tests.

use crate::{GatewayState, SharedState};
use async_trait::async_trait;
use axum::Json;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use oscopilot_agent::Orchestrator;
use oscopilot_core::error::{ProviderError, ToolError};
use oscopilot_core::message::Message;
use oscopilot_core::provider::{Provider, ProviderRequest, ProviderResponse};
use oscopilot_core::tool::{Tool, ToolRegistry};
use oscopilot_tools::opendigger::REACHABILITY_REPO;
use oscopilot_tools::{DataSources, GitHubClient, OpenDiggerClient};
use serde_json::{Value, json};
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Replays queued assistant messages, one per call.
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<Result<Message, ProviderError>>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<Result<Message, ProviderError>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
        }
    }

    pub fn text(text: &str) -> Self {
        Self::new(vec![Ok(Message::assistant(text))])
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "gateway_mock"
    }

    async fn complete(&self, _request: ProviderRequest) -> Result<ProviderResponse, ProviderError> {
        let reply = self.replies.lock().unwrap().pop_front().unwrap_or_else(|| {
            Err(ProviderError::ApiError {
                status_code: 500,
                message: "script exhausted".into(),
            })
        });
        Ok(ProviderResponse {
            message: reply?,
            usage: None,
            model: "mock-model".into(),
        })
    }
}

/// Stands in for the real health analysis tool.
pub struct ReportTool;

#[async_trait]
impl Tool for ReportTool {
    fn name(&self) -> &str {
        "analyze_repo_health"
    }

    fn description(&self) -> &str {
        "Canned health report"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({"type": "object", "properties": {"repo": {"type": "string"}}})
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let repo = arguments["repo"].as_str().unwrap_or("unknown/repo");
        Ok(format!("## 📊 {repo} 健康度分析报告\n\n### 综合评分: 80/100"))
    }
}

/// Clients that fail fast: nothing listens on the discard port.
fn unreachable_sources() -> DataSources {
    let http = reqwest::Client::new();
    DataSources::new(
        OpenDiggerClient::new(http.clone(), "http://127.0.0.1:9", 16, Duration::from_secs(60)),
        GitHubClient::new(http, "http://127.0.0.1:9", None),
    )
}

pub fn test_state(provider: ScriptedProvider) -> SharedState {
    test_state_with_sources(provider, unreachable_sources())
}

pub fn test_state_with_sources(provider: ScriptedProvider, sources: DataSources) -> SharedState {
    let mut registry = ToolRegistry::new();
    registry.register(ReportTool);
    let orchestrator = Orchestrator::new(Arc::new(provider), "mock-model", Arc::new(registry));
    Arc::new(GatewayState {
        orchestrator: Arc::new(orchestrator),
        sources,
    })
}

struct UpstreamState {
    files: HashMap<String, Value>,
    requests: AtomicUsize,
}

/// OpenDigger stand-in serving a few metric files for `apache/dubbo`.
/// GitHub requests, under `/github`, all answer 404.
pub struct UpstreamServer {
    addr: SocketAddr,
    state: Arc<UpstreamState>,
}

fn months(values: &[f64]) -> Value {
    let start = 7 - values.len();
    let map: serde_json::Map<String, Value> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("2024-{:02}", start + i), json!(v)))
        .collect();
    Value::Object(map)
}

impl UpstreamServer {
    pub async fn start() -> Self {
        let reachability = format!("{REACHABILITY_REPO}/openrank");
        let files: HashMap<String, Value> = [
            ("apache/dubbo/openrank", months(&[40.0, 42.0, 44.0, 46.0, 47.0, 48.5])),
            ("apache/dubbo/activity", months(&[20.0, 21.0, 22.0, 22.0, 23.0, 24.0])),
            ("apache/dubbo/stars", months(&[300.0, 310.0, 320.0, 330.0, 340.0, 350.0])),
            ("apache/dubbo/participants", months(&[320.0])),
            ("apache/dubbo/new_contributors", months(&[12.0])),
            ("apache/dubbo/bus_factor", months(&[6.0])),
            (reachability.as_str(), months(&[100.0])),
        ]
        .into_iter()
        .map(|(path, body)| (format!("/{path}.json"), body))
        .collect();

        let state = Arc::new(UpstreamState {
            files,
            requests: AtomicUsize::new(0),
        });
        let app = axum::Router::new().fallback(serve_file).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self { addr, state }
    }

    pub fn sources(&self) -> DataSources {
        let http = reqwest::Client::new();
        DataSources::new(
            OpenDiggerClient::new(http.clone(), format!("http://{}", self.addr), 16, Duration::from_secs(60)),
            GitHubClient::new(http, format!("http://{}/github", self.addr), None),
        )
    }

    pub fn requests(&self) -> usize {
        self.state.requests.load(Ordering::SeqCst)
    }
}

async fn serve_file(State(state): State<Arc<UpstreamState>>, uri: Uri) -> Response {
    state.requests.fetch_add(1, Ordering::SeqCst);
    match state.files.get(uri.path()) {
        Some(body) => Json(body.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
