//! Windowed, paginated review extraction.
//!
//! The full date range is split into calendar-month windows and each
//! window is read page by page, so memory and query cost stay bounded
//! regardless of the job's span. Answers are fetched in one batched
//! query per page and grouped back onto their reviews before
//! aggregation.

use std::collections::HashMap;

use domain::models::{AggregatedReview, ExportParams};
use domain::services::order_labels;
use persistence::db::is_connectivity_error;
use persistence::repositories::{ExportJobRepository, ReviewRepository};
use shared::windows::month_windows;
use tracing::{debug, error, warn};

/// Read-phase progress is capped here; the remaining points belong to
/// the build and upload phases.
const READ_PROGRESS_CAP: i32 = 95;

/// The outcome of the read phase: aggregated reviews in extraction
/// order and the answer labels resolved into column order.
pub struct Extraction {
    pub reviews: Vec<AggregatedReview>,
    pub labels: Vec<String>,
}

/// Reads and aggregates every matching review for one job.
pub struct ExportReader {
    reviews: ReviewRepository,
    jobs: ExportJobRepository,
    page_size: i64,
}

impl ExportReader {
    pub fn new(reviews: ReviewRepository, jobs: ExportJobRepository, page_size: i64) -> Self {
        Self {
            reviews,
            jobs,
            page_size,
        }
    }

    /// Extracts all matching reviews, reporting progress as pages
    /// complete. `total` is the pre-counted match total and drives the
    /// progress math.
    pub async fn read_all(
        &self,
        job_id: i32,
        product_id: i32,
        params: &ExportParams,
        total: i64,
    ) -> Result<Extraction, sqlx::Error> {
        let mut reviews = Vec::new();
        let mut discovered_labels: Vec<String> = Vec::new();
        let mut rows_done: i64 = 0;

        for window in month_windows(params.start_date, params.end_date) {
            let mut offset = 0i64;

            loop {
                // Connectivity faults abort the attempt (the stale
                // sweep recovers it); query faults on reads degrade to
                // an empty result.
                let page = match self
                    .reviews
                    .fetch_page(
                        product_id,
                        window.start,
                        window.end,
                        params,
                        self.page_size,
                        offset,
                    )
                    .await
                {
                    Ok(page) => page,
                    Err(e) if is_connectivity_error(&e) => return Err(e),
                    Err(e) => {
                        error!(job_id, error = %e, "Review page query failed, window skipped");
                        break;
                    }
                };
                if page.is_empty() {
                    break;
                }

                let ids: Vec<i32> = page.iter().map(|r| r.id).collect();
                let answers = match self.reviews.fetch_answers(&ids).await {
                    Ok(answers) => answers,
                    Err(e) if is_connectivity_error(&e) => return Err(e),
                    Err(e) => {
                        error!(job_id, error = %e, "Answer query failed, page kept answerless");
                        Vec::new()
                    }
                };

                let mut by_review: HashMap<i32, Vec<_>> = HashMap::new();
                for answer in answers {
                    by_review
                        .entry(answer.review_id)
                        .or_default()
                        .push(answer.into_domain());
                }

                let page_len = page.len() as i64;
                for entity in page {
                    let id = entity.id;
                    let review = entity.into_domain(by_review.remove(&id).unwrap_or_default());

                    for answer in &review.answers {
                        if answer.answer_text.is_some()
                            && !discovered_labels.contains(&answer.field_label)
                        {
                            discovered_labels.push(answer.field_label.clone());
                        }
                    }

                    reviews.push(AggregatedReview::from_review(review));
                }

                rows_done += page_len;
                if total > 0 {
                    let percent =
                        ((READ_PROGRESS_CAP as i64 * rows_done) / total).min(READ_PROGRESS_CAP as i64);
                    // Progress is best effort: a failed write never
                    // aborts the extraction.
                    if let Err(e) = self.jobs.update_progress(job_id, percent as i32).await {
                        warn!(job_id, error = %e, "Progress update skipped");
                    }
                }

                debug!(
                    job_id,
                    window_start = %window.start,
                    rows_done,
                    "Extraction page complete"
                );

                if page_len < self.page_size {
                    break;
                }
                offset += self.page_size;
            }
        }

        Ok(Extraction {
            labels: order_labels(discovered_labels),
            reviews,
        })
    }
}
