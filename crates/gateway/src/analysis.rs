//! Analysis API: rule-based health scores straight from the data sources,
//! no model involved.
//!
//! - `GET  /api/analysis/repo/{owner}/{repo}`: one repository
//! - `POST /api/analysis/compare`: a JSON array of `owner/repo` slugs

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::response::Json;
use serde::Serialize;
use tracing::{info, warn};

use crate::SharedState;
use crate::api::ApiError;
use oscopilot_core::error::ToolError;
use oscopilot_core::request::is_repo_slug;
use oscopilot_tools::analysis::{self, Analysis, HealthScore};
use oscopilot_tools::opendigger::MetricSeries;

/// Repositories accepted by one compare call.
pub const MAX_COMPARE: usize = 5;

/// Months of history returned per trend line.
const TREND_MONTHS: usize = 12;

#[derive(Debug, Serialize)]
pub struct ContributorSummary {
    pub participants: f64,
    pub new: f64,
    pub bus_factor: f64,
}

#[derive(Debug, Serialize)]
pub struct Trends {
    pub openrank: Vec<f64>,
    pub activity: Vec<f64>,
    pub stars: Vec<f64>,
}

#[derive(Debug, Serialize)]
pub struct RepoAnalysisResponse {
    pub repo: String,
    pub health_score: HealthScore,
    pub openrank: Option<f64>,
    pub activity: Option<f64>,
    pub stars: f64,
    pub contributors: ContributorSummary,
    pub trends: Trends,
}

impl RepoAnalysisResponse {
    fn new(repo: String, analysis: Analysis) -> Self {
        let Analysis { snapshot, health } = analysis;
        let trend = |series: &MetricSeries| -> Vec<f64> {
            series.recent(TREND_MONTHS).into_iter().map(|(_, v)| v).collect()
        };
        Self {
            trends: Trends {
                openrank: trend(&snapshot.openrank_history),
                activity: trend(&snapshot.activity_history),
                stars: trend(&snapshot.stars_history),
            },
            repo,
            health_score: health,
            openrank: snapshot.openrank,
            activity: snapshot.activity,
            stars: snapshot.stars,
            contributors: ContributorSummary {
                participants: snapshot.participants,
                new: snapshot.new_contributors,
                bus_factor: snapshot.bus_factor,
            },
        }
    }
}

/// One compare row: the analysis, or why it is missing.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Comparison {
    Analyzed(Box<RepoAnalysisResponse>),
    Failed { repo: String, error: String },
}

#[derive(Debug, Serialize)]
pub struct CompareResponse {
    pub comparisons: Vec<Comparison>,
}

fn lookup_error(repo: &str, err: ToolError) -> ApiError {
    warn!(repo, error = %err, "Repository analysis failed");
    match err {
        ToolError::Upstream { .. } => ApiError::not_found(err.to_string()),
        other => ApiError::bad_request(other.to_string()),
    }
}

pub(crate) async fn repo_handler(
    State(state): State<SharedState>,
    Path((owner, name)): Path<(String, String)>,
) -> Result<Json<RepoAnalysisResponse>, ApiError> {
    let repo = format!("{owner}/{name}");
    if !is_repo_slug(&repo) {
        return Err(ApiError::bad_request(format!("invalid repository: {repo}")));
    }
    info!(%repo, "api/analysis/repo request");

    let analysis = analysis::analyze(&state.sources, &repo)
        .await
        .map_err(|e| lookup_error(&repo, e))?;
    Ok(Json(RepoAnalysisResponse::new(repo, analysis)))
}

/// Scores every listed repository concurrently. A repository that cannot be
/// analyzed becomes an `error` row instead of failing the whole call.
pub(crate) async fn compare_handler(
    State(state): State<SharedState>,
    payload: Result<Json<Vec<String>>, JsonRejection>,
) -> Result<Json<CompareResponse>, ApiError> {
    let Json(raw) = payload?;

    let mut repos: Vec<String> = Vec::new();
    for repo in raw.iter().map(|r| r.trim()) {
        if !is_repo_slug(repo) {
            return Err(ApiError::bad_request(format!("invalid repository: {repo}")));
        }
        if !repos.iter().any(|r| r == repo) {
            repos.push(repo.to_string());
        }
    }
    if !(1..=MAX_COMPARE).contains(&repos.len()) {
        return Err(ApiError::bad_request(format!(
            "compare needs 1 to {MAX_COMPARE} distinct repositories, got {}",
            repos.len()
        )));
    }
    info!(repos = repos.len(), "api/analysis/compare request");

    let analyses =
        futures::future::join_all(repos.iter().map(|repo| analysis::analyze(&state.sources, repo))).await;

    let comparisons = repos
        .into_iter()
        .zip(analyses)
        .map(|(repo, result)| match result {
            Ok(analysis) => Comparison::Analyzed(Box::new(RepoAnalysisResponse::new(repo, analysis))),
            Err(e) => {
                warn!(%repo, error = %e, "Compare entry failed");
                Comparison::Failed {
                    repo,
                    error: e.to_string(),
                }
            }
        })
        .collect();

    Ok(Json(CompareResponse { comparisons }))
}
