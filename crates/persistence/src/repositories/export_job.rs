//! Export job repository: the only writer of the shared job table.

use chrono::{DateTime, Duration, Utc};
use sqlx::PgPool;
use tracing::debug;

use crate::entities::ClaimedExportEntity;

/// Result of one stale-job sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclaimOutcome {
    /// Jobs put back to idle for another attempt.
    pub requeued: Vec<i32>,
    /// Jobs that exhausted their attempt budget and were marked error.
    pub abandoned: Vec<i32>,
}

/// Repository for export job database operations.
#[derive(Clone)]
pub struct ExportJobRepository {
    pool: PgPool,
}

impl ExportJobRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Number of jobs currently in processing, for admission control.
    pub async fn count_processing(&self) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM public."Export"
            WHERE status = 'processing'::"StatusExport"
            "#,
        )
        .fetch_one(&self.pool)
        .await
    }

    /// Atomically claims the oldest idle job, if any.
    ///
    /// The claim is a single conditional update with a row lock and
    /// non-blocking skip, so two concurrent ticks (timer and liveness
    /// trigger) can never claim the same row. The claimed row comes
    /// back joined with the owner's email and the product title;
    /// progress is reset to 0 and the start timestamp stamped.
    pub async fn claim_next_idle(&self) -> Result<Option<ClaimedExportEntity>, sqlx::Error> {
        sqlx::query_as::<_, ClaimedExportEntity>(
            r#"
            WITH claimed AS (
                UPDATE public."Export" e
                SET status = 'processing'::"StatusExport",
                    "startDate" = NOW(),
                    progress = 0
                WHERE e.id = (
                    SELECT id FROM public."Export"
                    WHERE status = 'idle'::"StatusExport"
                    ORDER BY created_at ASC
                    LIMIT 1
                    FOR UPDATE SKIP LOCKED
                )
                RETURNING e.id, e.user_id, e.product_id, e.params, e.type,
                          e.status, e.progress, e.attempts, e.created_at
            )
            SELECT c.id, c.user_id, c.product_id, c.params,
                   c.type AS format, c.status::text AS status,
                   c.progress, c.attempts, c.created_at,
                   u.email AS user_email, p.title AS product_title
            FROM claimed c
            JOIN public."User" u ON c.user_id = u.id
            JOIN public."Product" p ON c.product_id = p.id
            "#,
        )
        .fetch_optional(&self.pool)
        .await
    }

    /// Puts jobs stuck in processing past `timeout` back to idle, or
    /// marks them error once their attempt budget is spent.
    ///
    /// Runs once per scheduler tick before claiming, guaranteeing
    /// forward progress after a worker crash.
    pub async fn reclaim_stale(
        &self,
        timeout: Duration,
        max_attempts: i32,
    ) -> Result<ReclaimOutcome, sqlx::Error> {
        let cutoff: DateTime<Utc> = Utc::now() - timeout;

        let abandoned: Vec<i32> = sqlx::query_scalar(
            r#"
            UPDATE public."Export"
            SET status = 'error'::"StatusExport",
                "endDate" = NOW(),
                attempts = attempts + 1
            WHERE status = 'processing'::"StatusExport"
              AND "startDate" < $1
              AND attempts + 1 >= $2
            RETURNING id
            "#,
        )
        .bind(cutoff)
        .bind(max_attempts)
        .fetch_all(&self.pool)
        .await?;

        let requeued: Vec<i32> = sqlx::query_scalar(
            r#"
            UPDATE public."Export"
            SET status = 'idle'::"StatusExport",
                "startDate" = NULL,
                attempts = attempts + 1
            WHERE status = 'processing'::"StatusExport"
              AND "startDate" < $1
            RETURNING id
            "#,
        )
        .bind(cutoff)
        .fetch_all(&self.pool)
        .await?;

        Ok(ReclaimOutcome {
            requeued,
            abandoned,
        })
    }

    /// Records incremental progress. Monotonic within an attempt: the
    /// row never moves backwards even if pages land out of order.
    pub async fn update_progress(&self, job_id: i32, percent: i32) -> Result<(), sqlx::Error> {
        let percent = percent.clamp(0, 100);
        sqlx::query(
            r#"
            UPDATE public."Export"
            SET progress = GREATEST(progress, $2)
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(percent)
        .execute(&self.pool)
        .await?;

        debug!(job_id, percent, "Export progress updated");
        Ok(())
    }

    /// Terminal transition to done with the download link.
    pub async fn mark_done(&self, job_id: i32, link: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE public."Export"
            SET status = 'done'::"StatusExport",
                "endDate" = NOW(),
                link = $2,
                progress = 100
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .bind(link)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Terminal transition to error. The job table carries no error
    /// message column, so the cause is logged here, keyed by job id.
    pub async fn mark_error(&self, job_id: i32, cause: &str) -> Result<(), sqlx::Error> {
        tracing::error!(job_id, cause, "Export job marked error");
        sqlx::query(
            r#"
            UPDATE public."Export"
            SET status = 'error'::"StatusExport",
                "endDate" = NOW()
            WHERE id = $1
            "#,
        )
        .bind(job_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
