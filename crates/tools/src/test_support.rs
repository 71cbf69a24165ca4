//! Local HTTP server standing in for OpenDigger and GitHub in tests.
//!
//! OpenDigger files are served under `/opendigger`, GitHub endpoints under
//! `/github`. Unknown paths answer 404.

use crate::DataSources;
use crate::github::GitHubClient;
use crate::opendigger::OpenDiggerClient;
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone, Default)]
pub struct Fixtures {
    routes: HashMap<String, (StatusCode, Value)>,
}

impl Fixtures {
    pub fn json(mut self, path: impl Into<String>, body: Value) -> Self {
        self.routes.insert(path.into(), (StatusCode::OK, body));
        self
    }

    pub fn status(mut self, path: impl Into<String>, status: StatusCode) -> Self {
        self.routes.insert(path.into(), (status, json!({"message": "fixture error"})));
        self
    }

    pub fn merge(mut self, other: Fixtures) -> Self {
        self.routes.extend(other.routes);
        self
    }

    fn metric(self, repo: &str, metric: &str, body: Value) -> Self {
        self.json(format!("/opendigger/{repo}/{metric}.json"), body)
    }
}

#[derive(Default)]
struct Recorded {
    hits: HashMap<String, usize>,
    headers: HashMap<String, HeaderMap>,
}

struct ServerState {
    fixtures: Fixtures,
    recorded: Mutex<Recorded>,
}

pub struct FixtureServer {
    addr: SocketAddr,
    state: Arc<ServerState>,
}

impl FixtureServer {
    pub async fn start(fixtures: Fixtures) -> Self {
        let state = Arc::new(ServerState {
            fixtures,
            recorded: Mutex::new(Recorded::default()),
        });
        let app = Router::new().fallback(serve).with_state(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, state }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub fn opendigger(&self) -> OpenDiggerClient {
        OpenDiggerClient::new(
            reqwest::Client::new(),
            self.url("/opendigger"),
            64,
            Duration::from_secs(60),
        )
    }

    pub fn github(&self) -> GitHubClient {
        GitHubClient::new(reqwest::Client::new(), self.url("/github"), None)
    }

    pub fn sources(&self) -> DataSources {
        DataSources::new(self.opendigger(), self.github())
    }

    pub fn hits(&self, path: &str) -> usize {
        let recorded = self.state.recorded.lock().unwrap();
        recorded.hits.get(path).copied().unwrap_or(0)
    }

    pub fn last_headers(&self, path: &str) -> Option<HeaderMap> {
        let recorded = self.state.recorded.lock().unwrap();
        recorded.headers.get(path).cloned()
    }
}

async fn serve(State(state): State<Arc<ServerState>>, uri: Uri, headers: HeaderMap) -> Response {
    let path = uri.path().to_string();
    {
        let mut recorded = state.recorded.lock().unwrap();
        *recorded.hits.entry(path.clone()).or_default() += 1;
        recorded.headers.insert(path.clone(), headers);
    }

    match state.fixtures.routes.get(&path) {
        Some((status, body)) => (*status, Json(body.clone())).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

fn months(values: &[f64]) -> Value {
    // Oldest first, ending at 2024-06.
    let start = 7 - values.len() as i32;
    let map: serde_json::Map<String, Value> = values
        .iter()
        .enumerate()
        .map(|(i, v)| (format!("2024-{:02}", start + i as i32), json!(v)))
        .collect();
    Value::Object(map)
}

/// A large healthy project and a small struggling one.
pub fn opendigger_fixtures() -> Fixtures {
    Fixtures::default()
        .metric("apache/dubbo", "openrank", months(&[40.0, 42.0, 44.0, 46.0, 47.0, 48.5]))
        .metric("apache/dubbo", "activity", months(&[20.0, 21.0, 22.0, 22.0, 23.0, 24.0]))
        .metric("apache/dubbo", "attention", months(&[150.0]))
        .metric("apache/dubbo", "stars", months(&[300.0, 310.0, 320.0, 330.0, 340.0, 350.0]))
        .metric("apache/dubbo", "participants", months(&[320.0]))
        .metric("apache/dubbo", "new_contributors", months(&[12.0]))
        .metric("apache/dubbo", "bus_factor", months(&[6.0]))
        .metric("apache/dubbo", "issues_new", months(&[50.0]))
        .metric("apache/dubbo", "issues_closed", months(&[45.0]))
        .metric("apache/dubbo", "issue_response_time", json!({"avg": months(&[20.0])}))
        .metric("apache/dubbo", "issue_resolution_duration", json!({"avg": months(&[100.0])}))
        .metric("apache/dubbo", "change_requests", months(&[80.0]))
        .metric("apache/dubbo", "change_requests_accepted", months(&[60.0]))
        .metric("apache/dubbo", "change_requests_reviews", months(&[200.0]))
        .metric("tiny/project", "openrank", months(&[3.0, 2.0, 1.0]))
        .metric("tiny/project", "activity", months(&[4.0, 3.0, 2.0]))
        .metric("tiny/project", "stars", months(&[10.0, 5.0, 2.0]))
        .metric("tiny/project", "participants", months(&[4.0]))
        .metric("tiny/project", "new_contributors", months(&[0.0]))
        .metric("tiny/project", "bus_factor", months(&[1.0]))
        .metric("tiny/project", "issue_response_time", json!({"avg": months(&[200.0])}))
        .metric("tiny/project", "issue_resolution_duration", json!({"avg": months(&[800.0])}))
        .metric("tiny/project", "change_requests", months(&[10.0]))
        .metric("tiny/project", "change_requests_accepted", months(&[2.0]))
}

pub fn github_fixtures() -> Fixtures {
    Fixtures::default()
        .json(
            "/github/repos/apache/dubbo",
            json!({
                "name": "dubbo",
                "full_name": "apache/dubbo",
                "description": "The java implementation of Apache Dubbo.",
                "language": "Java",
                "stargazers_count": 40512,
                "forks_count": 26310,
                "open_issues_count": 812,
                "license": {"key": "apache-2.0", "name": "Apache License 2.0"},
                "updated_at": "2024-06-30T08:00:00Z",
                "archived": false,
                "topics": ["rpc", "microservices", "java"]
            }),
        )
        .json(
            "/github/repos/tiny/project",
            json!({"full_name": "tiny/project", "stargazers_count": 12, "license": null}),
        )
        .json(
            "/github/repos/apache/dubbo/contributors",
            json!([
                {"login": "chickenlj", "contributions": 1520},
                {"login": "AlbumenJ", "contributions": 1204},
                {"login": "beiwei30", "contributions": 611}
            ]),
        )
        .json(
            "/github/search/issues",
            json!({
                "total_count": 2,
                "items": [
                    {"number": 14001, "title": "Improve docs for triple protocol", "html_url": "https://github.com/apache/dubbo/issues/14001"},
                    {"number": 14017, "title": "Add unit tests for registry", "html_url": "https://github.com/apache/dubbo/issues/14017"}
                ]
            }),
        )
}

pub fn all_fixtures() -> Fixtures {
    opendigger_fixtures().merge(github_fixtures())
}
