//! Export job dispatcher.
//!
//! One `run_once` call is one tick: sweep stale jobs, check the
//! admission limit, then claim at most one idle job and run it to
//! completion. A failure in the job marks it as error and never
//! aborts the tick.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, Utc};
use domain::models::{AggregatedReview, ExportParams};
use persistence::entities::ClaimedExportEntity;
use persistence::repositories::{ExportJobRepository, ReviewRepository};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::config::ExportConfig;
use crate::services::artifact::{
    build_sharded, build_single, should_shard, Artifact, ArtifactError,
};
use crate::services::email::EmailService;
use crate::services::reader::{ExportReader, Extraction};
use crate::services::storage::{ObjectStorage, StorageError};

/// Progress checkpoint after the artifact is encoded.
const PROGRESS_BUILT: i32 = 98;

/// Progress checkpoint after the artifact is uploaded and presigned.
const PROGRESS_UPLOADED: i32 = 99;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error(transparent)]
    Artifact(#[from] ArtifactError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Drives export jobs from claim to terminal status.
pub struct ExportService {
    jobs: ExportJobRepository,
    reviews: ReviewRepository,
    reader: ExportReader,
    storage: ObjectStorage,
    email: EmailService,
    settings: ExportConfig,
}

impl ExportService {
    pub fn new(
        jobs: ExportJobRepository,
        reviews: ReviewRepository,
        storage: ObjectStorage,
        email: EmailService,
        settings: ExportConfig,
    ) -> Self {
        let reader = ExportReader::new(reviews.clone(), jobs.clone(), settings.page_size);
        Self {
            jobs,
            reviews,
            reader,
            storage,
            email,
            settings,
        }
    }

    /// One scheduler tick: stale sweep, admission check, then at most
    /// one claimed job run synchronously to completion.
    ///
    /// Single job per tick keeps the concurrency argument trivial: the
    /// processing count can only grow by one between checks.
    pub async fn run_once(&self) -> Result<(), ExportError> {
        self.sweep_stale().await?;

        let in_flight = self.jobs.count_processing().await?;
        if in_flight >= self.settings.concurrency_limit {
            info!(in_flight, "Processing slots full, deferring idle jobs");
            return Ok(());
        }

        let Some(job) = self.jobs.claim_next_idle().await? else {
            return Ok(());
        };

        let job_id = job.id;
        info!(
            job_id,
            product_id = job.product_id,
            attempts = job.attempts,
            format = %job.export_format(),
            "Claimed export job"
        );

        if let Err(e) = self.process_job(job).await {
            error!(job_id, error = %e, "Export job failed");
            if let Err(mark_err) = self.jobs.mark_error(job_id, &e.to_string()).await {
                error!(job_id, error = %mark_err, "Failed to record job error status");
            }
        }
        Ok(())
    }

    /// Requeues timed-out jobs and abandons those out of attempts.
    async fn sweep_stale(&self) -> Result<(), ExportError> {
        let outcome = self
            .jobs
            .reclaim_stale(
                Duration::seconds(self.settings.stale_timeout_secs),
                self.settings.max_attempts,
            )
            .await?;

        if !outcome.requeued.is_empty() {
            warn!(jobs = ?outcome.requeued, "Requeued stale export jobs");
        }
        if !outcome.abandoned.is_empty() {
            warn!(
                jobs = ?outcome.abandoned,
                max_attempts = self.settings.max_attempts,
                "Abandoned export jobs after exhausting attempts"
            );
        }
        Ok(())
    }

    /// Progress writes are best effort everywhere: a failed write is
    /// logged and never fails the job.
    async fn report_progress(&self, job_id: i32, percent: i32) {
        if let Err(e) = self.jobs.update_progress(job_id, percent).await {
            warn!(job_id, percent, error = %e, "Progress update skipped");
        }
    }

    /// Runs one claimed job through extraction, encoding, upload,
    /// notification, and finalization.
    async fn process_job(&self, job: ClaimedExportEntity) -> Result<(), ExportError> {
        let params = ExportParams::parse(job.params.as_deref(), Utc::now().date_naive());
        let format = job.export_format();

        let total = self.reviews.count_reviews(job.product_id, &params).await?;
        info!(
            job_id = job.id,
            total,
            start_date = %params.start_date,
            end_date = %params.end_date,
            "Counted matching reviews"
        );

        let extraction = self
            .reader
            .read_all(job.id, job.product_id, &params, total)
            .await?;

        let sharded = should_shard(total, self.settings.shard_threshold);
        let now = Utc::now();
        // Both branches consume the review collections, so the raw
        // source data is released before the upload starts.
        let Extraction { reviews, labels } = extraction;
        let artifact: Artifact = if sharded {
            build_sharded(
                format,
                partition_by_year(reviews),
                &labels,
                &job.product_title,
                now,
            )?
        } else {
            build_single(format, reviews, &labels, &job.product_title, now)?
        };
        self.report_progress(job.id, PROGRESS_BUILT).await;

        let size = artifact.bytes.len();
        self.storage
            .upload(&artifact.filename, artifact.bytes, artifact.content_type)
            .await?;
        let link = self.storage.presign_download(&artifact.filename).await?;
        self.report_progress(job.id, PROGRESS_UPLOADED).await;

        // Best effort: a notification failure must not fail the job.
        if let Err(e) = self
            .email
            .send_export_ready(&job.user_email, &link, sharded)
            .await
        {
            warn!(job_id = job.id, error = %e, "Export notification failed");
        }

        self.jobs.mark_done(job.id, &link).await?;
        info!(
            job_id = job.id,
            filename = %artifact.filename,
            bytes = size,
            reviews = total,
            sharded,
            "Export job complete"
        );
        Ok(())
    }
}

/// Groups reviews into per-year shards, preserving extraction order
/// inside each year.
fn partition_by_year(reviews: Vec<AggregatedReview>) -> BTreeMap<i32, Vec<AggregatedReview>> {
    let mut by_year: BTreeMap<i32, Vec<AggregatedReview>> = BTreeMap::new();
    for review in reviews {
        by_year.entry(review.created_at.year()).or_default().push(review);
    }
    by_year
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::collections::HashMap;

    fn review(id: i64, year: i32, month: u32) -> AggregatedReview {
        AggregatedReview {
            id,
            form_id: None,
            product_id: 1,
            button_id: None,
            xwiki_id: None,
            created_at: Utc.with_ymd_and_hms(year, month, 1, 0, 0, 0).unwrap(),
            answers: HashMap::new(),
        }
    }

    #[test]
    fn test_partition_by_year_preserves_order_within_year() {
        let reviews = vec![
            review(1, 2023, 12),
            review(2, 2024, 1),
            review(3, 2023, 6),
        ];
        let by_year = partition_by_year(reviews);

        assert_eq!(by_year.keys().copied().collect::<Vec<_>>(), vec![2023, 2024]);
        let ids: Vec<i64> = by_year[&2023].iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![1, 3]);
    }
}
