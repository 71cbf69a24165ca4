//! GitHub-backed tools.

use crate::{DataSources, repo_argument, repo_schema};
use async_trait::async_trait;
use oscopilot_core::error::ToolError;
use oscopilot_core::tool::Tool;
use std::fmt::Write;

const MAX_LISTED: usize = 10;

/// `40512` -> `40,512`
fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

pub struct GitHubRepoInfoTool {
    sources: DataSources,
}

impl GitHubRepoInfoTool {
    pub fn new(sources: DataSources) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl Tool for GitHubRepoInfoTool {
    fn name(&self) -> &str {
        "get_github_repo_info"
    }

    fn description(&self) -> &str {
        "获取 GitHub 仓库的基本信息，包括 Star 数、Fork 数、描述等。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let repo = repo_argument(&arguments)?;
        let Some(info) = self.sources.github.repo_info(&repo).await? else {
            return Ok(format!("未找到仓库 {repo}，请检查仓库路径是否正确。"));
        };

        let mut out = format!(
            "仓库 {} 的基本信息：\n\
             - 描述: {}\n\
             - 主要语言: {}\n\
             - Star 数: {}\n\
             - Fork 数: {}\n\
             - 开放 Issue 数: {}\n\
             - 许可证: {}\n\
             - 最后更新: {}\n\
             - 是否归档: {}",
            info.full_name,
            info.description.as_deref().filter(|d| !d.is_empty()).unwrap_or("无"),
            info.language.as_deref().unwrap_or("未知"),
            group_thousands(info.stars),
            group_thousands(info.forks),
            group_thousands(info.open_issues),
            info.license.as_ref().map(|l| l.name.as_str()).unwrap_or("未知"),
            info.updated_at.as_deref().unwrap_or("未知"),
            if info.archived { "是" } else { "否" },
        );

        if !info.topics.is_empty() {
            let topics: Vec<&str> = info.topics.iter().take(MAX_LISTED).map(String::as_str).collect();
            let _ = write!(out, "\n- 标签: {}", topics.join(", "));
        }
        Ok(out)
    }
}

pub struct GitHubContributorsTool {
    sources: DataSources,
}

impl GitHubContributorsTool {
    pub fn new(sources: DataSources) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl Tool for GitHubContributorsTool {
    fn name(&self) -> &str {
        "get_github_contributors"
    }

    fn description(&self) -> &str {
        "获取 GitHub 仓库的主要贡献者列表（Top 10）。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let repo = repo_argument(&arguments)?;
        let contributors = self
            .sources
            .github
            .contributors(&repo, MAX_LISTED as u32)
            .await?;

        if contributors.is_empty() {
            return Ok(format!("未能获取仓库 {repo} 的贡献者信息。"));
        }

        let mut out = format!("仓库 {repo} 的 Top 10 贡献者：\n");
        for (i, c) in contributors.iter().take(MAX_LISTED).enumerate() {
            let _ = writeln!(out, "{}. {} - {} 次贡献", i + 1, c.login, c.contributions);
        }
        Ok(out)
    }
}

pub struct GoodFirstIssuesTool {
    sources: DataSources,
}

impl GoodFirstIssuesTool {
    pub fn new(sources: DataSources) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl Tool for GoodFirstIssuesTool {
    fn name(&self) -> &str {
        "find_good_first_issues"
    }

    fn description(&self) -> &str {
        "查找仓库中适合新手贡献的 Issues（标记为 good first issue）。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let repo = repo_argument(&arguments)?;
        let issues = self.sources.github.good_first_issues(&repo).await?;

        if issues.is_empty() {
            return Ok(format!(
                "仓库 {repo} 目前没有标记为 'good first issue' 的开放 Issue。"
            ));
        }

        let mut out = format!("仓库 {repo} 中适合新手的 Issues：\n");
        for issue in issues.iter().take(MAX_LISTED) {
            let _ = writeln!(out, "- #{}: {}", issue.number, issue.title);
            let _ = writeln!(out, "  链接: {}", issue.html_url);
        }
        Ok(out)
    }
}
