//! GitHub REST client.

use oscopilot_core::error::ToolError;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

const SERVICE: &str = "GitHub";

#[derive(Debug, Clone, Deserialize)]
pub struct RepoInfo {
    pub full_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(rename = "stargazers_count", default)]
    pub stars: u64,
    #[serde(rename = "forks_count", default)]
    pub forks: u64,
    #[serde(rename = "open_issues_count", default)]
    pub open_issues: u64,
    #[serde(default)]
    pub license: Option<License>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct License {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contributor {
    pub login: String,
    #[serde(default)]
    pub contributions: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct IssueSummary {
    pub number: u64,
    pub title: String,
    pub html_url: String,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<IssueSummary>,
}

pub struct GitHubClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, token: Option<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let mut request = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .header(ACCEPT, "application/vnd.github.v3+json")
            .header(USER_AGENT, "OpenSource-Copilot");
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("token {token}"));
        }
        request
    }

    /// Send a request and decode the body. Statuses in `absent` mean
    /// "nothing there" and yield `Ok(None)`.
    async fn fetch<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
        absent: &[StatusCode],
    ) -> Result<Option<T>, ToolError> {
        let response = request.send().await.map_err(|e| upstream(e.to_string()))?;
        let status = response.status();

        if absent.contains(&status) {
            debug!(%status, "GitHub resource not found");
            return Ok(None);
        }
        if !status.is_success() {
            warn!(%status, "GitHub API error");
            return Err(upstream(format!("HTTP {status}")));
        }

        response
            .json::<T>()
            .await
            .map(Some)
            .map_err(|e| upstream(format!("malformed response: {e}")))
    }

    /// `None` when the repository does not exist.
    pub async fn repo_info(&self, repo: &str) -> Result<Option<RepoInfo>, ToolError> {
        self.fetch(self.get(&format!("/repos/{repo}")), &[StatusCode::NOT_FOUND])
            .await
    }

    pub async fn contributors(&self, repo: &str, per_page: u32) -> Result<Vec<Contributor>, ToolError> {
        let request = self
            .get(&format!("/repos/{repo}/contributors"))
            .query(&[("per_page", per_page)]);
        Ok(self
            .fetch(request, &[StatusCode::NOT_FOUND, StatusCode::NO_CONTENT])
            .await?
            .unwrap_or_default())
    }

    /// Open issues labelled "good first issue".
    pub async fn good_first_issues(&self, repo: &str) -> Result<Vec<IssueSummary>, ToolError> {
        let query = format!("repo:{repo} is:issue is:open label:\"good first issue\"");
        let request = self
            .get("/search/issues")
            .query(&[("q", query.as_str()), ("per_page", "20")]);

        // The search endpoint answers 422 for repositories it cannot see.
        let found: Option<SearchResponse> = self
            .fetch(request, &[StatusCode::NOT_FOUND, StatusCode::UNPROCESSABLE_ENTITY])
            .await?;
        Ok(found.map(|r| r.items).unwrap_or_default())
    }
}

fn upstream(reason: String) -> ToolError {
    ToolError::Upstream {
        service: SERVICE.into(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixtureServer, Fixtures, github_fixtures};

    #[tokio::test]
    async fn repo_info_decodes_fields() {
        let server = FixtureServer::start(github_fixtures()).await;
        let info = server.github().repo_info("apache/dubbo").await.unwrap().unwrap();

        assert_eq!(info.full_name, "apache/dubbo");
        assert_eq!(info.stars, 40512);
        assert_eq!(info.license.unwrap().name, "Apache License 2.0");
        assert_eq!(info.topics.len(), 3);
    }

    #[tokio::test]
    async fn sends_github_headers() {
        let server = FixtureServer::start(github_fixtures()).await;
        let client = GitHubClient::new(reqwest::Client::new(), server.url("/github"), Some("abc".into()));
        client.repo_info("apache/dubbo").await.unwrap();

        let headers = server.last_headers("/github/repos/apache/dubbo").unwrap();
        assert_eq!(headers["user-agent"], "OpenSource-Copilot");
        assert_eq!(headers["accept"], "application/vnd.github.v3+json");
        assert_eq!(headers["authorization"], "token abc");
    }

    #[tokio::test]
    async fn missing_repo_is_none() {
        let server = FixtureServer::start(github_fixtures()).await;
        assert!(server.github().repo_info("ghost/repo").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn server_error_is_upstream() {
        let fixtures = Fixtures::default()
            .status("/github/repos/apache/dubbo", axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        let server = FixtureServer::start(fixtures).await;
        let err = server.github().repo_info("apache/dubbo").await.unwrap_err();
        assert!(matches!(err, ToolError::Upstream { ref service, .. } if service == "GitHub"));
    }

    #[tokio::test]
    async fn contributors_and_issues() {
        let server = FixtureServer::start(github_fixtures()).await;
        let client = server.github();

        let contributors = client.contributors("apache/dubbo", 10).await.unwrap();
        assert_eq!(contributors[0].login, "chickenlj");

        let issues = client.good_first_issues("apache/dubbo").await.unwrap();
        assert_eq!(issues.len(), 2);
        assert_eq!(issues[0].number, 14001);
    }

    #[tokio::test]
    async fn unsearchable_repo_has_no_issues() {
        let fixtures = Fixtures::default()
            .status("/github/search/issues", axum::http::StatusCode::UNPROCESSABLE_ENTITY);
        let server = FixtureServer::start(fixtures).await;
        assert!(server.github().good_first_issues("ghost/repo").await.unwrap().is_empty());
    }
}
