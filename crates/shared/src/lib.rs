//! Shared utilities for the export worker.
//!
//! This crate contains:
//! - Filename sanitization for object-storage keys
//! - Calendar-month window splitting for paginated extraction

pub mod sanitize;
pub mod windows;
