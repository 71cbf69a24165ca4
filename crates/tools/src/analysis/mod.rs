//! Repository health analysis.
//!
//! `collect` merges OpenDigger and GitHub data into a [`RepoSnapshot`];
//! everything downstream (scoring, diagnosis, advice, report rendering)
//! is a pure function of that snapshot.

pub mod advice;
pub mod diagnosis;
pub mod report;
pub mod score;

use crate::DataSources;
use crate::opendigger::MetricSeries;
use oscopilot_core::error::ToolError;
use tracing::warn;

pub use advice::{Priority, Recommendation, advise};
pub use diagnosis::{Diagnosis, Severity, Trend, classify_trend, diagnose};
pub use score::{HealthScore, score};

/// The inputs every rule reads.
#[derive(Debug, Clone, Default)]
pub struct RepoSnapshot {
    pub openrank: Option<f64>,
    pub activity: Option<f64>,
    pub participants: f64,
    pub new_contributors: f64,
    pub bus_factor: f64,
    pub merge_rate: f64,
    /// Hours; absent or zero means no data
    pub avg_response_time: Option<f64>,
    /// Hours
    pub avg_resolution_time: Option<f64>,
    /// GitHub stargazers
    pub stars: f64,
    pub openrank_history: MetricSeries,
    pub activity_history: MetricSeries,
    pub stars_history: MetricSeries,
}

#[derive(Debug, Clone)]
pub struct Analysis {
    pub snapshot: RepoSnapshot,
    pub health: HealthScore,
}

/// Fetch everything the rules need, concurrently.
///
/// A GitHub failure only costs the star count. A repository OpenDigger
/// knows nothing about is an upstream error.
pub async fn collect(sources: &DataSources, repo: &str) -> Result<RepoSnapshot, ToolError> {
    let (metrics, info, contributors, issues, prs) = tokio::join!(
        sources.opendigger.repo_metrics(repo),
        sources.github.repo_info(repo),
        sources.opendigger.contributor_stats(repo),
        sources.opendigger.issue_stats(repo),
        sources.opendigger.pr_stats(repo),
    );

    if metrics.is_empty() {
        return Err(ToolError::Upstream {
            service: "OpenDigger".into(),
            reason: format!("no metrics published for {repo}"),
        });
    }

    let stars = match info {
        Ok(Some(info)) => info.stars as f64,
        Ok(None) => 0.0,
        Err(e) => {
            warn!(repo, error = %e, "GitHub repo info unavailable, scoring without stars");
            0.0
        }
    };

    let history = |metric: &str| metrics.history(metric).cloned().unwrap_or_default();

    Ok(RepoSnapshot {
        openrank: metrics.latest("openrank"),
        activity: metrics.latest("activity"),
        participants: contributors.total_participants,
        new_contributors: contributors.new_contributors,
        bus_factor: contributors.bus_factor,
        merge_rate: prs.merge_rate,
        avg_response_time: issues.avg_response_time.filter(|t| *t > 0.0),
        avg_resolution_time: issues.avg_resolution_time.filter(|t| *t > 0.0),
        stars,
        openrank_history: history("openrank"),
        activity_history: history("activity"),
        stars_history: history("stars"),
    })
}

pub async fn analyze(sources: &DataSources, repo: &str) -> Result<Analysis, ToolError> {
    let snapshot = collect(sources, repo).await?;
    let health = score(&snapshot);
    Ok(Analysis { snapshot, health })
}

/// Whole numbers without a fraction, everything else with up to two decimals.
pub(crate) fn display_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        let s = format!("{value:.2}");
        s.trim_end_matches('0').trim_end_matches('.').to_string()
    }
}

pub(crate) fn display_optional(value: Option<f64>) -> String {
    value.map(display_number).unwrap_or_else(|| "N/A".into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FixtureServer, Fixtures, all_fixtures, opendigger_fixtures};

    #[test]
    fn number_display() {
        assert_eq!(display_number(320.0), "320");
        assert_eq!(display_number(48.5), "48.5");
        assert_eq!(display_number(12.346), "12.35");
        assert_eq!(display_optional(None), "N/A");
    }

    #[tokio::test]
    async fn collects_snapshot() {
        let server = FixtureServer::start(all_fixtures()).await;
        let snapshot = collect(&server.sources(), "apache/dubbo").await.unwrap();

        assert_eq!(snapshot.openrank, Some(48.5));
        assert_eq!(snapshot.participants, 320.0);
        assert_eq!(snapshot.stars, 40512.0);
        assert_eq!(snapshot.avg_response_time, Some(20.0));
        assert_eq!(snapshot.openrank_history.len(), 6);
    }

    #[tokio::test]
    async fn github_outage_only_loses_stars() {
        let fixtures = opendigger_fixtures().status(
            "/github/repos/apache/dubbo",
            axum::http::StatusCode::BAD_GATEWAY,
        );
        let server = FixtureServer::start(fixtures).await;
        let snapshot = collect(&server.sources(), "apache/dubbo").await.unwrap();
        assert_eq!(snapshot.stars, 0.0);
        assert_eq!(snapshot.openrank, Some(48.5));
    }

    #[tokio::test]
    async fn unknown_repo_is_upstream_error() {
        let server = FixtureServer::start(Fixtures::default()).await;
        let err = collect(&server.sources(), "ghost/repo").await.unwrap_err();
        assert!(matches!(err, ToolError::Upstream { ref service, .. } if service == "OpenDigger"));
    }
}
