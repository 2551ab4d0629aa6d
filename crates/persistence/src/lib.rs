//! Persistence layer for the review export worker.
//!
//! This crate contains:
//! - Database connection management
//! - Entity definitions (database row mappings)
//! - Repository implementations (job store gateway, review reader)

pub mod db;
pub mod entities;
pub mod repositories;
