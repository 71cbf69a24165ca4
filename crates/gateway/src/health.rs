//! `GET /api/health`: reachability of the services a request depends on.
//!
//! The plain `/health` route only says the process is up. This one probes
//! OpenDigger and the model backend concurrently and reports `degraded`
//! when either is down.

use axum::extract::State;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::SharedState;

/// Upper bound on each probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceHealth {
    Healthy,
    Unhealthy,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub name: String,
    pub status: ServiceHealth,
    /// Zero when the probe failed
    pub latency_ms: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DependencyHealth {
    /// `healthy` or `degraded`
    pub status: String,
    pub services: BTreeMap<String, ServiceStatus>,
}

fn millis(elapsed: Duration) -> f64 {
    (elapsed.as_micros() as f64 / 10.0).round() / 100.0
}

/// Run one probe under [`PROBE_TIMEOUT`]. Failures and timeouts report zero latency.
async fn probe<E: std::fmt::Display>(
    name: &str,
    check: impl Future<Output = Result<Duration, E>>,
) -> ServiceStatus {
    let (status, latency_ms) = match tokio::time::timeout(PROBE_TIMEOUT, check).await {
        Ok(Ok(elapsed)) => (ServiceHealth::Healthy, millis(elapsed)),
        Ok(Err(e)) => {
            warn!(service = name, error = %e, "Dependency probe failed");
            (ServiceHealth::Unhealthy, 0.0)
        }
        Err(_) => {
            warn!(service = name, "Dependency probe timed out");
            (ServiceHealth::Unhealthy, 0.0)
        }
    };
    ServiceStatus {
        name: name.to_string(),
        status,
        latency_ms,
    }
}

pub(crate) async fn dependencies_handler(State(state): State<SharedState>) -> Json<DependencyHealth> {
    let provider = state.orchestrator.provider();
    let model_check = async {
        let started = Instant::now();
        match provider.health_check().await {
            Ok(true) => Ok(started.elapsed()),
            Ok(false) => Err("backend answered with an error status".to_string()),
            Err(e) => Err(e.to_string()),
        }
    };

    let (opendigger, model) = tokio::join!(
        probe("opendigger", state.sources.opendigger.check_reachable()),
        probe("model", model_check),
    );

    let services: BTreeMap<String, ServiceStatus> =
        [opendigger, model].into_iter().map(|s| (s.name.clone(), s)).collect();
    let healthy = services.values().all(|s| s.status == ServiceHealth::Healthy);
    debug!(healthy, "Dependency health checked");

    Json(DependencyHealth {
        status: if healthy { "healthy" } else { "degraded" }.into(),
        services,
    })
}
