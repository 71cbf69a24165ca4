//! Report tools: full health analysis, diagnosis, advice and comparison.

use crate::analysis::{self, display_optional, report};
use crate::{DataSources, normalize_repo, repo_argument, repo_schema};
use async_trait::async_trait;
use oscopilot_core::error::ToolError;
use oscopilot_core::tool::Tool;
use std::fmt::Write;
use tracing::debug;

pub struct AnalyzeRepoHealthTool {
    sources: DataSources,
}

impl AnalyzeRepoHealthTool {
    pub fn new(sources: DataSources) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl Tool for AnalyzeRepoHealthTool {
    fn name(&self) -> &str {
        "analyze_repo_health"
    }

    fn description(&self) -> &str {
        "全面分析开源仓库的健康状况，包括 OpenRank、活跃度、贡献者等多维度指标。这是分析项目的主要入口工具。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let repo = repo_argument(&arguments)?;
        let analysis = analysis::analyze(&self.sources, &repo).await?;
        debug!(repo = %repo, overall = analysis.health.overall, "Health analysis complete");
        Ok(report::health_report(&repo, &analysis))
    }
}

pub struct DiagnoseRepoIssuesTool {
    sources: DataSources,
}

impl DiagnoseRepoIssuesTool {
    pub fn new(sources: DataSources) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl Tool for DiagnoseRepoIssuesTool {
    fn name(&self) -> &str {
        "diagnose_repo_issues"
    }

    fn description(&self) -> &str {
        "诊断开源仓库存在的问题和潜在风险。在分析健康度后使用此工具获取详细的问题诊断。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let repo = repo_argument(&arguments)?;
        let snapshot = analysis::collect(&self.sources, &repo).await?;
        let diagnosis = analysis::diagnose(&snapshot);
        Ok(report::diagnosis_report(&repo, &diagnosis))
    }
}

pub struct ImprovementSuggestionsTool {
    sources: DataSources,
}

impl ImprovementSuggestionsTool {
    pub fn new(sources: DataSources) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl Tool for ImprovementSuggestionsTool {
    fn name(&self) -> &str {
        "get_improvement_suggestions"
    }

    fn description(&self) -> &str {
        "获取针对开源仓库的改进建议。基于诊断结果提供可执行的优化建议。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let repo = repo_argument(&arguments)?;
        let analysis = analysis::analyze(&self.sources, &repo).await?;
        let recommendations = analysis::advise(&analysis.snapshot, &analysis.health);
        Ok(report::advice_report(&repo, &recommendations))
    }
}

const MIN_COMPARE: usize = 2;
const MAX_COMPARE: usize = 5;

pub struct CompareReposTool {
    sources: DataSources,
}

impl CompareReposTool {
    pub fn new(sources: DataSources) -> Self {
        Self { sources }
    }
}

struct CompareRow {
    repo: String,
    openrank: Option<f64>,
    activity: Option<f64>,
    participants: Option<f64>,
    bus_factor: Option<f64>,
}

impl CompareRow {
    fn has_data(&self) -> bool {
        self.openrank.is_some()
            || self.activity.is_some()
            || self.participants.is_some()
            || self.bus_factor.is_some()
    }
}

/// Split a comma-separated list, dropping blanks and repeats.
fn parse_repo_list(raw: &str) -> Result<Vec<String>, ToolError> {
    let mut repos: Vec<String> = Vec::new();
    for part in raw.split([',', '，']).map(str::trim).filter(|p| !p.is_empty()) {
        let repo = normalize_repo(part)?;
        if !repos.contains(&repo) {
            repos.push(repo);
        }
    }

    if !(MIN_COMPARE..=MAX_COMPARE).contains(&repos.len()) {
        return Err(ToolError::InvalidArguments(format!(
            "compare_repos needs {MIN_COMPARE} to {MAX_COMPARE} distinct repositories, got {}",
            repos.len()
        )));
    }
    Ok(repos)
}

#[async_trait]
impl Tool for CompareReposTool {
    fn name(&self) -> &str {
        "compare_repos"
    }

    fn description(&self) -> &str {
        "对比多个开源仓库的健康度指标（OpenRank、活跃度、参与者、巴士因子）。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "repos": {
                    "type": "string",
                    "description": "用逗号分隔的 2 到 5 个仓库，如 \"apache/dubbo,vuejs/vue,facebook/react\""
                }
            },
            "required": ["repos"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let raw = arguments["repos"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("Missing 'repos' argument".into()))?;
        let repos = parse_repo_list(raw)?;

        let od = &self.sources.opendigger;
        let rows = futures::future::join_all(repos.into_iter().map(|repo| async move {
            let (openrank, activity, participants, bus_factor) = tokio::join!(
                od.latest(&repo, "openrank"),
                od.latest(&repo, "activity"),
                od.latest(&repo, "participants"),
                od.latest(&repo, "bus_factor"),
            );
            CompareRow {
                repo,
                openrank,
                activity,
                participants,
                bus_factor,
            }
        }))
        .await;

        if !rows.iter().any(CompareRow::has_data) {
            return Err(ToolError::Upstream {
                service: "OpenDigger".into(),
                reason: "no metrics published for any of the requested repositories".into(),
            });
        }

        let mut out = String::from(
            "## ⚖️ 仓库对比\n\n\
             | 仓库 | OpenRank | 活跃度 | 参与者 | 巴士因子 |\n\
             |------|----------|--------|--------|----------|\n",
        );
        for row in &rows {
            let _ = writeln!(
                out,
                "| {} | {} | {} | {} | {} |",
                row.repo,
                display_optional(row.openrank),
                display_optional(row.activity),
                display_optional(row.participants),
                display_optional(row.bus_factor),
            );
        }

        let leader = rows
            .iter()
            .filter_map(|r| r.openrank.map(|v| (r, v)))
            .max_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((row, value)) = leader {
            let _ = write!(
                out,
                "\nOpenRank 最高: **{}** ({})\n",
                row.repo,
                analysis::display_number(value)
            );
        }

        let missing: Vec<&str> = rows
            .iter()
            .filter(|r| !r.has_data())
            .map(|r| r.repo.as_str())
            .collect();
        if !missing.is_empty() {
            let _ = write!(out, "\n未能获取以下仓库的数据: {}\n", missing.join(", "));
        }

        Ok(out)
    }
}
