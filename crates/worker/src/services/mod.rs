//! Worker services: extraction, artifact assembly, storage, email,
//! and the dispatcher that drives a job end to end.

pub mod artifact;
pub mod email;
pub mod export;
pub mod reader;
pub mod storage;

pub use email::EmailService;
pub use export::ExportService;
pub use storage::ObjectStorage;
