//! Repository analysis tools for OpenSource Copilot.
//!
//! Tools give the agent access to open-source project data:
//! OpenDigger metrics, the GitHub REST API, a rule-based health analysis
//! built on both, and a small static knowledge base of community
//! operations practice.

pub mod analysis;
pub mod cache;
pub mod github;
pub mod github_tools;
pub mod knowledge;
pub mod metric_tools;
pub mod opendigger;
pub mod report_tools;

#[cfg(test)]
pub(crate) mod test_support;

use oscopilot_config::DataSourcesConfig;
use oscopilot_core::error::ToolError;
use oscopilot_core::request::is_repo_slug;
use oscopilot_core::tool::ToolRegistry;
use std::sync::Arc;
use std::time::Duration;

pub use github::GitHubClient;
pub use opendigger::OpenDiggerClient;

/// Upstream clients shared by every tool in a registry.
#[derive(Clone)]
pub struct DataSources {
    pub opendigger: Arc<OpenDiggerClient>,
    pub github: Arc<GitHubClient>,
}

impl DataSources {
    pub fn new(opendigger: OpenDiggerClient, github: GitHubClient) -> Self {
        Self {
            opendigger: Arc::new(opendigger),
            github: Arc::new(github),
        }
    }

    pub fn from_config(config: &DataSourcesConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        let opendigger = OpenDiggerClient::new(
            http.clone(),
            config.opendigger_base_url.clone(),
            config.cache_capacity,
            Duration::from_secs(config.cache_ttl_secs),
        );
        let github = GitHubClient::new(
            http,
            config.github_api_url.clone(),
            config.github_token.clone(),
        );
        Self::new(opendigger, github)
    }
}

/// Create the registry with all twelve tools.
pub fn default_registry(config: &DataSourcesConfig) -> ToolRegistry {
    registry_with(DataSources::from_config(config))
}

/// Same as [`default_registry`] over existing clients.
pub fn registry_with(sources: DataSources) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    registry.register(report_tools::AnalyzeRepoHealthTool::new(sources.clone()));
    registry.register(report_tools::DiagnoseRepoIssuesTool::new(sources.clone()));
    registry.register(report_tools::ImprovementSuggestionsTool::new(sources.clone()));
    registry.register(report_tools::CompareReposTool::new(sources.clone()));
    registry.register(metric_tools::OpenRankTool::new(sources.clone()));
    registry.register(metric_tools::HealthMetricsTool::new(sources.clone()));
    registry.register(metric_tools::ContributorsInfoTool::new(sources.clone()));
    registry.register(metric_tools::ActivityTrendTool::new(sources.clone()));
    registry.register(github_tools::GitHubRepoInfoTool::new(sources.clone()));
    registry.register(github_tools::GitHubContributorsTool::new(sources.clone()));
    registry.register(github_tools::GoodFirstIssuesTool::new(sources));
    registry.register(knowledge::KnowledgeSearchTool);
    registry
}

/// Read and normalize the `repo` argument.
///
/// Accepts `owner/name` as well as a pasted GitHub URL.
pub(crate) fn repo_argument(arguments: &serde_json::Value) -> Result<String, ToolError> {
    let raw = arguments["repo"]
        .as_str()
        .ok_or_else(|| ToolError::InvalidArguments("Missing 'repo' argument".into()))?;
    normalize_repo(raw)
}

pub(crate) fn normalize_repo(raw: &str) -> Result<String, ToolError> {
    let trimmed = raw.trim();
    let slug = trimmed
        .strip_prefix("https://github.com/")
        .or_else(|| trimmed.strip_prefix("http://github.com/"))
        .or_else(|| trimmed.strip_prefix("github.com/"))
        .unwrap_or(trimmed)
        .trim_end_matches('/')
        .trim_end_matches(".git");

    if is_repo_slug(slug) {
        Ok(slug.to_string())
    } else {
        Err(ToolError::InvalidArguments(format!(
            "'{raw}' is not a repository in owner/name form"
        )))
    }
}

/// JSON schema for tools taking a single `repo` argument.
pub(crate) fn repo_schema() -> serde_json::Value {
    serde_json::json!({
        "type": "object",
        "properties": {
            "repo": {
                "type": "string",
                "description": "仓库路径，格式为 \"owner/repo\"，例如 \"apache/dubbo\""
            }
        },
        "required": ["repo"]
    })
}
