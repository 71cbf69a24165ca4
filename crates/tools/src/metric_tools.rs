//! Single-metric OpenDigger tools.

use crate::analysis::display_number;
use crate::{DataSources, repo_argument, repo_schema};
use async_trait::async_trait;
use oscopilot_core::error::ToolError;
use oscopilot_core::tool::Tool;
use std::fmt::Write;

fn openrank_level(openrank: f64) -> &'static str {
    match openrank {
        v if v > 100.0 => "极高，是顶级开源项目",
        v if v > 50.0 => "很高，是知名开源项目",
        v if v > 20.0 => "较高，是活跃的开源项目",
        v if v > 5.0 => "中等，有一定影响力",
        _ => "较低，需要提升影响力",
    }
}

pub struct OpenRankTool {
    sources: DataSources,
}

impl OpenRankTool {
    pub fn new(sources: DataSources) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl Tool for OpenRankTool {
    fn name(&self) -> &str {
        "get_repo_openrank"
    }

    fn description(&self) -> &str {
        "获取开源仓库的 OpenRank 值。OpenRank 是衡量开源项目影响力的核心指标。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let repo = repo_argument(&arguments)?;
        Ok(match self.sources.opendigger.latest(&repo, "openrank").await {
            Some(value) => format!(
                "仓库 {repo} 的 OpenRank 值为 {value:.2}，影响力{}。",
                openrank_level(value)
            ),
            None => format!("未能获取仓库 {repo} 的 OpenRank 数据，请检查仓库路径是否正确。"),
        })
    }
}

pub struct HealthMetricsTool {
    sources: DataSources,
}

impl HealthMetricsTool {
    pub fn new(sources: DataSources) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl Tool for HealthMetricsTool {
    fn name(&self) -> &str {
        "get_repo_health_metrics"
    }

    fn description(&self) -> &str {
        "获取开源仓库的健康度指标，包括活跃度、关注度、贡献者等多维度数据。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let repo = repo_argument(&arguments)?;
        let metrics = self.sources.opendigger.repo_metrics(&repo).await;
        if metrics.is_empty() {
            return Ok(format!(
                "未能获取仓库 {repo} 的健康度指标，请检查仓库路径是否正确。"
            ));
        }

        let mut out = format!("仓库 {repo} 的健康度指标：");
        let decimal = [("openrank", "OpenRank"), ("activity", "活跃度"), ("attention", "关注度")];
        for (metric, label) in decimal {
            if let Some(v) = metrics.latest(metric).filter(|v| *v != 0.0) {
                let _ = write!(out, "\n- {label}: {v:.2}");
            }
        }
        let counts = [("participants", "参与者数"), ("bus_factor", "巴士因子")];
        for (metric, label) in counts {
            if let Some(v) = metrics.latest(metric).filter(|v| *v != 0.0) {
                let _ = write!(out, "\n- {label}: {}", display_number(v));
            }
        }
        Ok(out)
    }
}

pub struct ContributorsInfoTool {
    sources: DataSources,
}

impl ContributorsInfoTool {
    pub fn new(sources: DataSources) -> Self {
        Self { sources }
    }
}

#[async_trait]
impl Tool for ContributorsInfoTool {
    fn name(&self) -> &str {
        "get_repo_contributors_info"
    }

    fn description(&self) -> &str {
        "获取开源仓库的贡献者相关信息，包括贡献者数量、新增贡献者、巴士因子等。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        repo_schema()
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let repo = repo_argument(&arguments)?;
        let stats = self.sources.opendigger.contributor_stats(&repo).await;
        Ok(format!(
            "仓库 {repo} 的贡献者统计：\n\
             - 总参与者数: {}\n\
             - 新增贡献者: {}\n\
             - 巴士因子: {}\n\n\
             巴士因子说明：表示项目核心贡献者的数量，数值越高表示项目越不依赖单一开发者。",
            display_number(stats.total_participants),
            display_number(stats.new_contributors),
            display_number(stats.bus_factor),
        ))
    }
}

const DEFAULT_TREND_MONTHS: u64 = 6;
const MAX_TREND_MONTHS: u64 = 60;

pub struct ActivityTrendTool {
    sources: DataSources,
}

impl ActivityTrendTool {
    pub fn new(sources: DataSources) -> Self {
        Self { sources }
    }
}

fn describe_trend(first: f64, last: f64) -> String {
    if last > first {
        if first > 0.0 {
            format!("活跃度呈上升趋势，增长了 {:.1}%", (last - first) / first * 100.0)
        } else {
            "活跃度呈上升趋势".to_string()
        }
    } else if last < first {
        format!("活跃度呈下降趋势，下降了 {:.1}%", (first - last) / first * 100.0)
    } else {
        "活跃度保持稳定".to_string()
    }
}

#[async_trait]
impl Tool for ActivityTrendTool {
    fn name(&self) -> &str {
        "get_repo_activity_trend"
    }

    fn description(&self) -> &str {
        "获取开源仓库的活跃度趋势数据。"
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "repo": {
                    "type": "string",
                    "description": "仓库路径，格式为 \"owner/repo\""
                },
                "months": {
                    "type": "integer",
                    "description": "获取最近多少个月的数据，默认6个月",
                    "default": DEFAULT_TREND_MONTHS
                }
            },
            "required": ["repo"]
        })
    }

    async fn execute(&self, arguments: serde_json::Value) -> Result<String, ToolError> {
        let repo = repo_argument(&arguments)?;
        let months = arguments["months"]
            .as_u64()
            .unwrap_or(DEFAULT_TREND_MONTHS)
            .clamp(1, MAX_TREND_MONTHS) as usize;

        let trend = self.sources.opendigger.trend(&repo, "activity", months).await;
        let (Some((_, first)), Some((_, last))) = (trend.first(), trend.last()) else {
            return Ok(format!("未能获取仓库 {repo} 的活跃度趋势数据"));
        };

        let mut out = format!("仓库 {repo} 最近 {} 个月的活跃度趋势：\n", trend.len());
        for (month, value) in &trend {
            let _ = writeln!(out, "- {month}: {value:.2}");
        }
        if trend.len() >= 2 {
            let _ = write!(out, "\n趋势分析: {}", describe_trend(*first, *last));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixtureServer, opendigger_fixtures};
    use serde_json::json;

    #[test]
    fn level_thresholds() {
        assert_eq!(openrank_level(150.0), "极高，是顶级开源项目");
        assert_eq!(openrank_level(100.0), "很高，是知名开源项目");
        assert_eq!(openrank_level(48.5), "较高，是活跃的开源项目");
        assert_eq!(openrank_level(20.0), "中等，有一定影响力");
        assert_eq!(openrank_level(5.0), "较低，需要提升影响力");
    }

    #[test]
    fn trend_wording() {
        assert_eq!(describe_trend(20.0, 24.0), "活跃度呈上升趋势，增长了 20.0%");
        assert_eq!(describe_trend(4.0, 2.0), "活跃度呈下降趋势，下降了 50.0%");
        assert_eq!(describe_trend(3.0, 3.0), "活跃度保持稳定");
        assert_eq!(describe_trend(0.0, 3.0), "活跃度呈上升趋势");
    }

    #[tokio::test]
    async fn openrank_found_and_missing() {
        let server = FixtureServer::start(opendigger_fixtures()).await;
        let tool = OpenRankTool::new(server.sources());

        let out = tool.execute(json!({"repo": "apache/dubbo"})).await.unwrap();
        assert_eq!(out, "仓库 apache/dubbo 的 OpenRank 值为 48.50，影响力较高，是活跃的开源项目。");

        let out = tool.execute(json!({"repo": "ghost/repo"})).await.unwrap();
        assert_eq!(out, "未能获取仓库 ghost/repo 的 OpenRank 数据，请检查仓库路径是否正确。");
    }

    #[tokio::test]
    async fn health_metrics_lists_present_values() {
        let server = FixtureServer::start(opendigger_fixtures()).await;
        let tool = HealthMetricsTool::new(server.sources());
        let out = tool.execute(json!({"repo": "apache/dubbo"})).await.unwrap();
        assert_eq!(
            out,
            "仓库 apache/dubbo 的健康度指标：\n- OpenRank: 48.50\n- 活跃度: 24.00\n- 关注度: 150.00\n- 参与者数: 320\n- 巴士因子: 6"
        );
    }

    #[tokio::test]
    async fn contributors_info() {
        let server = FixtureServer::start(opendigger_fixtures()).await;
        let tool = ContributorsInfoTool::new(server.sources());
        let out = tool.execute(json!({"repo": "tiny/project"})).await.unwrap();
        assert!(out.contains("- 总参与者数: 4\n- 新增贡献者: 0\n- 巴士因子: 1"));
        assert!(out.ends_with("数值越高表示项目越不依赖单一开发者。"));
    }

    #[tokio::test]
    async fn activity_trend_defaults_to_six_months() {
        let server = FixtureServer::start(opendigger_fixtures()).await;
        let tool = ActivityTrendTool::new(server.sources());

        let out = tool.execute(json!({"repo": "apache/dubbo"})).await.unwrap();
        assert!(out.starts_with("仓库 apache/dubbo 最近 6 个月的活跃度趋势：\n- 2024-01: 20.00\n"));
        assert!(out.ends_with("趋势分析: 活跃度呈上升趋势，增长了 20.0%"));

        let out = tool
            .execute(json!({"repo": "apache/dubbo", "months": 2}))
            .await
            .unwrap();
        assert!(out.contains("最近 2 个月"));
        assert!(out.contains("- 2024-05: 23.00\n- 2024-06: 24.00\n"));
    }

    #[tokio::test]
    async fn activity_trend_without_data() {
        let server = FixtureServer::start(opendigger_fixtures()).await;
        let tool = ActivityTrendTool::new(server.sources());
        let out = tool.execute(json!({"repo": "ghost/repo"})).await.unwrap();
        assert_eq!(out, "未能获取仓库 ghost/repo 的活跃度趋势数据");
    }
}
