//! Export job status and output format.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Lifecycle status of an export job.
///
/// A job moves idle → processing → {done | error}, never skipping
/// processing. `error` is terminal; the stale sweep puts crashed jobs
/// back to idle until the attempt cap is reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportStatus {
    Idle,
    Processing,
    Done,
    Error,
}

impl std::fmt::Display for ExportStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportStatus::Idle => write!(f, "idle"),
            ExportStatus::Processing => write!(f, "processing"),
            ExportStatus::Done => write!(f, "done"),
            ExportStatus::Error => write!(f, "error"),
        }
    }
}

impl FromStr for ExportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "idle" => Ok(ExportStatus::Idle),
            "processing" => Ok(ExportStatus::Processing),
            "done" => Ok(ExportStatus::Done),
            "error" => Ok(ExportStatus::Error),
            _ => Err(format!("Unknown export status: {}", s)),
        }
    }
}

/// Output encoding requested for an export.
///
/// The job row stores `csv` or `xls` (legacy value from the submitting
/// UI); `xls` maps to the xlsx encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    Csv,
    Xlsx,
}

impl ExportFormat {
    /// Parse the job row's format field, defaulting to CSV.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "xls" | "xlsx" => ExportFormat::Xlsx,
            _ => ExportFormat::Csv,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }
}

impl std::fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.extension())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_display_from_str_roundtrip() {
        for status in [
            ExportStatus::Idle,
            ExportStatus::Processing,
            ExportStatus::Done,
            ExportStatus::Error,
        ] {
            assert_eq!(status.to_string().parse::<ExportStatus>().unwrap(), status);
        }
        assert!("unknown".parse::<ExportStatus>().is_err());
    }

    #[test]
    fn test_format_parse() {
        assert_eq!(ExportFormat::parse("csv"), ExportFormat::Csv);
        assert_eq!(ExportFormat::parse("xls"), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::parse("XLSX"), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::parse("anything-else"), ExportFormat::Csv);
    }

    #[test]
    fn test_format_extension() {
        assert_eq!(ExportFormat::Csv.extension(), "csv");
        assert_eq!(ExportFormat::Xlsx.extension(), "xlsx");
    }
}
