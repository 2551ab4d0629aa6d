use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::Mutex;
use tracing::info;

use persistence::repositories::{ExportJobRepository, ReviewRepository};

use export_worker::services::{EmailService, ExportService, ObjectStorage};
use export_worker::{app, config, jobs, logging};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;
    logging::init_logging(&config.logging);

    info!("Starting export worker v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&persistence::db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout_secs: config.database.connect_timeout_secs,
        idle_timeout_secs: config.database.idle_timeout_secs,
    })
    .await?;
    info!("Database pool ready");

    let storage = ObjectStorage::new(&config.storage).await;
    let email = EmailService::new(config.email.clone());

    let service = Arc::new(ExportService::new(
        ExportJobRepository::new(pool.clone()),
        ReviewRepository::new(pool.clone()),
        storage,
        email,
        config.export.clone(),
    ));
    let tick_lock = Arc::new(Mutex::new(()));

    let mut scheduler = jobs::JobScheduler::new();
    scheduler.register(jobs::ExportTickJob::new(
        Arc::clone(&service),
        Arc::clone(&tick_lock),
        config.export.tick_interval_secs,
    ));
    scheduler.start();

    let state = app::AppState {
        pool,
        service,
        tick_lock,
    };
    let app = app::create_app(state, config.server.request_timeout_secs);

    let addr = config.socket_addr();
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(30)).await;

    Ok(())
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("Shutdown signal received");
}
