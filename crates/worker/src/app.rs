use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use sqlx::PgPool;
use tokio::sync::Mutex;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::routes;
use crate::services::ExportService;

/// Shared state for the HTTP surface.
///
/// The export service and tick lock are the same instances the
/// background scheduler uses, so HTTP-triggered and timer-triggered
/// ticks serialize against each other.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub service: Arc<ExportService>,
    pub tick_lock: Arc<Mutex<()>>,
}

pub fn create_app(state: AppState, request_timeout_secs: u64) -> Router {
    Router::new()
        .route("/", get(routes::trigger_export))
        .route("/health", get(routes::health_check))
        .layer(TimeoutLayer::new(Duration::from_secs(request_timeout_secs)))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
