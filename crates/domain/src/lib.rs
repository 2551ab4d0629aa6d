//! Domain models and services for the review export worker.

pub mod models;
pub mod services;
