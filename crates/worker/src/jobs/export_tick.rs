//! Periodic export tick.
//!
//! The timer tick and the HTTP-triggered tick go through the same
//! guard: a `try_lock` on a shared mutex, so at most one tick runs at
//! a time and an overlapping trigger is skipped, not queued.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::info;

use super::scheduler::{Job, JobFrequency};
use crate::services::export::{ExportError, ExportService};

/// Runs one dispatcher pass unless another pass is already in flight.
/// Returns `Ok(false)` when the tick was skipped.
pub async fn run_guarded_tick(
    service: &ExportService,
    tick_lock: &Mutex<()>,
) -> Result<bool, ExportError> {
    let Ok(_guard) = tick_lock.try_lock() else {
        info!("Export tick already in flight, skipping");
        return Ok(false);
    };

    service.run_once().await?;
    Ok(true)
}

/// Background job driving the export dispatcher on a fixed interval.
pub struct ExportTickJob {
    service: Arc<ExportService>,
    tick_lock: Arc<Mutex<()>>,
    interval_secs: u64,
}

impl ExportTickJob {
    pub fn new(service: Arc<ExportService>, tick_lock: Arc<Mutex<()>>, interval_secs: u64) -> Self {
        Self {
            service,
            tick_lock,
            interval_secs,
        }
    }
}

#[async_trait::async_trait]
impl Job for ExportTickJob {
    fn name(&self) -> &'static str {
        "export_tick"
    }

    fn frequency(&self) -> JobFrequency {
        JobFrequency::Seconds(self.interval_secs)
    }

    async fn execute(&self) -> Result<(), String> {
        run_guarded_tick(&self.service, &self.tick_lock)
            .await
            .map(|_| ())
            .map_err(|e| format!("Export tick failed: {}", e))
    }
}
