//! HTTP handlers for the liveness surface.

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;
use tracing::error;

use crate::app::AppState;
use crate::jobs::run_guarded_tick;

/// Health check response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub database: DatabaseHealth,
}

/// Database health status.
#[derive(Debug, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct DatabaseHealth {
    pub connected: bool,
    pub latency_ms: Option<u64>,
}

/// Liveness trigger.
///
/// Runs one scheduler tick synchronously, then responds with the
/// fixed body external monitors expect. A tick already in flight is
/// skipped, not an error.
pub async fn trigger_export(State(state): State<AppState>) -> (StatusCode, &'static str) {
    if let Err(e) = run_guarded_tick(&state.service, &state.tick_lock).await {
        error!(error = %e, "HTTP-triggered export tick failed");
        return (StatusCode::INTERNAL_SERVER_ERROR, "Export process failed");
    }
    (StatusCode::OK, "Export process initiated")
}

/// Health check endpoint: reports database connectivity.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let start = std::time::Instant::now();
    let connected = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    let latency_ms = connected.then(|| start.elapsed().as_millis() as u64);

    let status_code = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status_code,
        Json(HealthResponse {
            status: if connected { "healthy" } else { "unhealthy" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            database: DatabaseHealth {
                connected,
                latency_ms,
            },
        }),
    )
}
