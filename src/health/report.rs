//! `/health` reporter.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;

use crate::health::memory::{MemoryProbe, MemoryUsage};
use crate::lifecycle::Lifecycle;
use crate::observability::metrics;
use crate::persistence::{Persistence, PersistenceError};

const DATABASE_FAILED: &str = "Database connection failed";
const SHUTTING_DOWN: &str = "Server is shutting down";

#[derive(Debug, Clone, Serialize)]
pub struct HealthyReport {
    pub status: &'static str,
    pub timestamp: String,
    pub environment: String,
    /// Seconds since the reporter was created.
    pub uptime: f64,
    pub memory: MemoryUsage,
    pub database: &'static str,
}

#[derive(Debug, Clone, Serialize)]
pub struct UnhealthyReport {
    pub status: &'static str,
    pub timestamp: String,
    pub error: &'static str,
}

/// Result of one probe.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum HealthReport {
    Healthy(HealthyReport),
    Unhealthy(UnhealthyReport),
}

impl HealthReport {
    fn unhealthy(error: &'static str) -> Self {
        HealthReport::Unhealthy(UnhealthyReport {
            status: "unhealthy",
            timestamp: timestamp(),
            error,
        })
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthReport::Healthy(_))
    }

    pub fn status_code(&self) -> StatusCode {
        if self.is_healthy() {
            StatusCode::OK
        } else {
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

impl IntoResponse for HealthReport {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Probes the persistence dependency on demand.
pub struct HealthReporter {
    persistence: Arc<dyn Persistence>,
    lifecycle: Arc<Lifecycle>,
    environment: String,
    probe_timeout: Duration,
    started_at: Instant,
    memory: MemoryProbe,
}

impl HealthReporter {
    pub fn new(
        persistence: Arc<dyn Persistence>,
        lifecycle: Arc<Lifecycle>,
        environment: impl Into<String>,
        probe_timeout: Duration,
    ) -> Self {
        Self {
            persistence,
            lifecycle,
            environment: environment.into(),
            probe_timeout,
            started_at: Instant::now(),
            memory: MemoryProbe::new(),
        }
    }

    pub async fn report(&self) -> HealthReport {
        if !self.lifecycle.is_accepting() {
            return HealthReport::unhealthy(SHUTTING_DOWN);
        }

        let probe = match tokio::time::timeout(self.probe_timeout, self.persistence.ping()).await {
            Ok(result) => result,
            Err(_) => Err(PersistenceError::Timeout),
        };
        metrics::record_health_probe(probe.is_ok());

        if let Err(e) = probe {
            tracing::warn!(error = %e, "Health probe failed");
            return HealthReport::unhealthy(DATABASE_FAILED);
        }

        HealthReport::Healthy(HealthyReport {
            status: "healthy",
            timestamp: timestamp(),
            environment: self.environment.clone(),
            uptime: self.started_at.elapsed().as_secs_f64(),
            memory: self.memory.sample(),
            database: "connected",
        })
    }
}

/// Axum handler for `GET /health`.
pub async fn health(State(reporter): State<Arc<HealthReporter>>) -> HealthReport {
    reporter.report().await
}
