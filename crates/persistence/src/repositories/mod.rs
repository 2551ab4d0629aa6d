//! Repository implementations.

pub mod export_job;
pub mod review;

pub use export_job::{ExportJobRepository, ReclaimOutcome};
pub use review::ReviewRepository;
