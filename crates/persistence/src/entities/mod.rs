//! Database row mappings.

pub mod export_job;
pub mod review;

pub use export_job::ClaimedExportEntity;
pub use review::{AnswerEntity, ReviewEntity};
