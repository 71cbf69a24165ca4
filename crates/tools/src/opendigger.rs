//! OpenDigger metric client.
//!
//! OpenDigger publishes one JSON file per repository and metric at
//! `{base}/{owner}/{repo}/{metric}.json`. Each file maps periods to values;
//! only the monthly `YYYY-MM` entries are read here.

use crate::cache::{CacheStats, TtlCache};
use oscopilot_core::error::ToolError;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Repository whose OpenRank file is fetched to check that OpenDigger answers.
pub const REACHABILITY_REPO: &str = "X-lab2017/open-digger";

/// Metrics fetched for a full repository snapshot.
pub const CORE_METRICS: [&str; 7] = [
    "openrank",
    "activity",
    "attention",
    "stars",
    "participants",
    "new_contributors",
    "bus_factor",
];

/// A month-keyed series, ordered oldest first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    points: BTreeMap<String, f64>,
}

impl MetricSeries {
    /// Parse an OpenDigger metric file.
    ///
    /// Duration metrics (`issue_response_time` and friends) nest the
    /// monthly map under `avg`; that series is used when present.
    pub fn from_json(value: &Value) -> Self {
        let source = match value.get("avg") {
            Some(avg @ Value::Object(_)) => avg,
            _ => value,
        };

        let points = source
            .as_object()
            .map(|map| {
                map.iter()
                    .filter(|(key, _)| is_month_key(key))
                    .filter_map(|(key, v)| v.as_f64().map(|n| (key.clone(), n)))
                    .collect()
            })
            .unwrap_or_default();

        Self { points }
    }

    /// Value at the most recent month.
    pub fn latest(&self) -> Option<f64> {
        self.points.values().next_back().copied()
    }

    /// The last `months` points, oldest first.
    pub fn recent(&self, months: usize) -> Vec<(String, f64)> {
        let skip = self.points.len().saturating_sub(months);
        self.points
            .iter()
            .skip(skip)
            .map(|(k, v)| (k.clone(), *v))
            .collect()
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.values().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for MetricSeries {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

fn is_month_key(key: &str) -> bool {
    let bytes = key.as_bytes();
    bytes.len() == 7
        && bytes[4] == b'-'
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[5..].iter().all(u8::is_ascii_digit)
}

/// The core metrics of one repository, keyed by metric name.
#[derive(Debug, Clone, Default)]
pub struct RepoMetrics {
    series: BTreeMap<&'static str, Arc<MetricSeries>>,
}

impl RepoMetrics {
    pub fn latest(&self, metric: &str) -> Option<f64> {
        self.series.get(metric).and_then(|s| s.latest())
    }

    pub fn history(&self, metric: &str) -> Option<&MetricSeries> {
        self.series.get(metric).map(Arc::as_ref)
    }

    /// True when OpenDigger published none of the core metrics.
    pub fn is_empty(&self) -> bool {
        self.series.values().all(|s| s.is_empty())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ContributorStats {
    pub total_participants: f64,
    pub new_contributors: f64,
    pub bus_factor: f64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct IssueStats {
    pub new_issues: f64,
    pub closed_issues: f64,
    /// Hours
    pub avg_response_time: Option<f64>,
    /// Hours
    pub avg_resolution_time: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PrStats {
    pub total_prs: f64,
    pub merged_prs: f64,
    pub merge_rate: f64,
    pub reviews: f64,
}

pub struct OpenDiggerClient {
    http: reqwest::Client,
    base_url: String,
    cache: TtlCache<MetricSeries>,
}

impl OpenDiggerClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        cache_capacity: usize,
        cache_ttl: Duration,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            cache: TtlCache::new(cache_capacity, cache_ttl),
        }
    }

    fn metric_url(&self, repo: &str, metric: &str) -> String {
        format!("{}/{}/{}.json", self.base_url, repo, metric)
    }

    /// Fetch one metric file. Non-200 responses and transport errors are
    /// logged and reported as `None`.
    pub async fn metric(&self, repo: &str, metric: &str) -> Option<Arc<MetricSeries>> {
        let key = format!("{repo}/{metric}");
        if let Some(hit) = self.cache.get(&key).await {
            return Some(hit);
        }

        let url = self.metric_url(repo, metric);
        let response = match self.http.get(&url).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(repo, metric, error = %e, "OpenDigger request failed");
                return None;
            }
        };

        if !response.status().is_success() {
            warn!(repo, metric, status = %response.status(), "OpenDigger returned an error status");
            return None;
        }

        let body: Value = match response.json().await {
            Ok(v) => v,
            Err(e) => {
                warn!(repo, metric, error = %e, "OpenDigger returned malformed JSON");
                return None;
            }
        };

        let series = MetricSeries::from_json(&body);
        debug!(repo, metric, points = series.len(), "Fetched OpenDigger metric");
        Some(self.cache.insert(key, series).await)
    }

    pub async fn latest(&self, repo: &str, metric: &str) -> Option<f64> {
        self.metric(repo, metric).await.and_then(|s| s.latest())
    }

    pub async fn repo_metrics(&self, repo: &str) -> RepoMetrics {
        let fetched = futures::future::join_all(
            CORE_METRICS.iter().map(|metric| self.metric(repo, metric)),
        )
        .await;

        let series = CORE_METRICS
            .iter()
            .zip(fetched)
            .filter_map(|(name, series)| series.map(|s| (*name, s)))
            .collect();

        RepoMetrics { series }
    }

    pub async fn contributor_stats(&self, repo: &str) -> ContributorStats {
        let (participants, new_contributors, bus_factor) = tokio::join!(
            self.latest(repo, "participants"),
            self.latest(repo, "new_contributors"),
            self.latest(repo, "bus_factor"),
        );

        ContributorStats {
            total_participants: participants.unwrap_or(0.0),
            new_contributors: new_contributors.unwrap_or(0.0),
            bus_factor: bus_factor.unwrap_or(0.0),
        }
    }

    pub async fn issue_stats(&self, repo: &str) -> IssueStats {
        let (new_issues, closed_issues, response, resolution) = tokio::join!(
            self.latest(repo, "issues_new"),
            self.latest(repo, "issues_closed"),
            self.latest(repo, "issue_response_time"),
            self.latest(repo, "issue_resolution_duration"),
        );

        IssueStats {
            new_issues: new_issues.unwrap_or(0.0),
            closed_issues: closed_issues.unwrap_or(0.0),
            avg_response_time: response,
            avg_resolution_time: resolution,
        }
    }

    pub async fn pr_stats(&self, repo: &str) -> PrStats {
        let (total, merged, reviews) = tokio::join!(
            self.latest(repo, "change_requests"),
            self.latest(repo, "change_requests_accepted"),
            self.latest(repo, "change_requests_reviews"),
        );

        let total_prs = total.unwrap_or(0.0);
        let merged_prs = merged.unwrap_or(0.0);
        PrStats {
            total_prs,
            merged_prs,
            merge_rate: if total_prs > 0.0 { merged_prs / total_prs } else { 0.0 },
            reviews: reviews.unwrap_or(0.0),
        }
    }

    /// The last `months` monthly values of a metric, oldest first.
    pub async fn trend(&self, repo: &str, metric: &str, months: usize) -> Vec<(String, f64)> {
        self.metric(repo, metric)
            .await
            .map(|s| s.recent(months))
            .unwrap_or_default()
    }

    /// Time an uncached fetch of a well-known metric file.
    pub async fn check_reachable(&self) -> Result<Duration, ToolError> {
        let upstream = |reason: String| ToolError::Upstream {
            service: "OpenDigger".into(),
            reason,
        };

        let started = Instant::now();
        let response = self
            .http
            .get(self.metric_url(REACHABILITY_REPO, "openrank"))
            .send()
            .await
            .map_err(|e| upstream(e.to_string()))?;
        if !response.status().is_success() {
            return Err(upstream(format!("HTTP {}", response.status().as_u16())));
        }
        Ok(started.elapsed())
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
