//! Domain models for the export worker.

pub mod export_job;
pub mod filters;
pub mod review;

pub use export_job::{ExportFormat, ExportStatus};
pub use filters::{ExportParams, ReviewFilters, DEFAULT_START_DATE};
pub use review::{AggregatedReview, Answer, Review, ANSWER_JOIN_SEPARATOR};
