//! Background job scheduler and job implementations.

mod export_tick;
mod scheduler;

pub use export_tick::{run_guarded_tick, ExportTickJob};
pub use scheduler::JobScheduler;
