//! Export job entity.

use chrono::{DateTime, Utc};
use domain::models::{ExportFormat, ExportStatus};
use sqlx::FromRow;
use std::str::FromStr;

/// A claimed export job row, joined with the owner's email and the
/// product title needed for notification and artifact naming.
#[derive(Debug, Clone, FromRow)]
pub struct ClaimedExportEntity {
    /// Export row identifier.
    pub id: i32,

    /// Owning user reference.
    pub user_id: i32,

    /// Target product reference.
    pub product_id: i32,

    /// Serialized filter specification (free-form JSON).
    pub params: Option<String>,

    /// Requested output format (`csv` or `xls`).
    pub format: Option<String>,

    /// Current lifecycle status.
    pub status: String,

    /// Progress percentage, reset to 0 on claim.
    pub progress: i32,

    /// Number of processing attempts, incremented by the stale sweep.
    pub attempts: i32,

    /// When the export was requested.
    pub created_at: DateTime<Utc>,

    /// Email of the owning user (joined).
    pub user_email: String,

    /// Title of the target product (joined).
    pub product_title: String,
}

impl ClaimedExportEntity {
    pub fn status(&self) -> ExportStatus {
        ExportStatus::from_str(&self.status).unwrap_or(ExportStatus::Idle)
    }

    pub fn export_format(&self) -> ExportFormat {
        self.format
            .as_deref()
            .map(ExportFormat::parse)
            .unwrap_or(ExportFormat::Csv)
    }
}
