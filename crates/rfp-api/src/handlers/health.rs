//! Liveness and readiness probes.

use std::time::Instant;

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Liveness: the process is up and serving.
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeState {
    Ok,
    Error,
}

/// Outcome of one dependency probe.
#[derive(Serialize)]
pub struct StoreProbe {
    pub status: ProbeState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Serialize)]
pub struct ReadinessChecks {
    pub store: StoreProbe,
}

#[derive(Serialize)]
pub struct ReadinessResponse {
    pub status: &'static str,
    pub checks: ReadinessChecks,
}

/// Readiness: round-trips the backing store. 503 while it is unreachable.
pub async fn ready(
    State(state): State<AppState>,
) -> Result<Json<ReadinessResponse>, (StatusCode, Json<ReadinessResponse>)> {
    let started = Instant::now();
    let store = match state.store.ping().await {
        Ok(()) => StoreProbe {
            status: ProbeState::Ok,
            latency_ms: Some(started.elapsed().as_millis() as u64),
            error: None,
        },
        Err(e) => StoreProbe {
            status: ProbeState::Error,
            latency_ms: None,
            error: Some(e.to_string()),
        },
    };

    let healthy = store.status == ProbeState::Ok;
    let body = Json(ReadinessResponse {
        status: if healthy { "ready" } else { "degraded" },
        checks: ReadinessChecks { store },
    });

    if healthy {
        Ok(body)
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, body))
    }
}
