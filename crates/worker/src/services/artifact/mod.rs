//! Artifact assembly: flat CSV, rich spreadsheet, or zip of per-year
//! shards.
//!
//! Sharding exists to cap the size of any one encoded buffer: above
//! the configured review-count threshold the export is split into one
//! file per calendar year and packed into a compressed archive.

mod flat;
mod sheet;

use chrono::{DateTime, Utc};
use domain::models::{AggregatedReview, ExportFormat};
use shared::sanitize::sanitize_filename;
use std::collections::BTreeMap;
use std::io::Write;
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub use flat::encode_csv;
pub use sheet::encode_xlsx;

/// Fixed leading columns of every export table.
pub const FIXED_COLUMNS: [&str; 6] = [
    "Review ID",
    "Form ID",
    "Product ID",
    "Button ID",
    "XWiki ID",
    "Review Created At",
];

/// Artifact encoding errors.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("CSV encoding error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Spreadsheet encoding error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error("Archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fully encoded export artifact ready for upload.
#[derive(Debug)]
pub struct Artifact {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: &'static str,
}

/// Sharding is selected iff the total strictly exceeds the threshold.
/// At the threshold exactly, a single file is produced.
pub fn should_shard(total_reviews: i64, threshold: i64) -> bool {
    total_reviews > threshold
}

/// `Avis_<product>_<YYYYMMDD_HHMMSS>.<ext>` with the product name
/// sanitized for object-storage keys.
pub fn artifact_filename(product_name: &str, extension: &str, now: DateTime<Utc>) -> String {
    format!(
        "Avis_{}_{}.{}",
        sanitize_filename(product_name),
        now.format("%Y%m%d_%H%M%S"),
        extension
    )
}

fn encode(
    format: ExportFormat,
    reviews: &[AggregatedReview],
    labels: &[String],
) -> Result<Vec<u8>, ArtifactError> {
    match format {
        ExportFormat::Csv => encode_csv(reviews, labels),
        ExportFormat::Xlsx => encode_xlsx(reviews, labels),
    }
}

fn content_type_for(format: ExportFormat) -> &'static str {
    match format {
        ExportFormat::Csv => "text/csv",
        ExportFormat::Xlsx => {
            "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
        }
    }
}

/// Encodes the whole job as one file.
///
/// Consumes the reviews so the raw source data is released as soon as
/// the encoded buffer exists.
pub fn build_single(
    format: ExportFormat,
    reviews: Vec<AggregatedReview>,
    labels: &[String],
    product_name: &str,
    now: DateTime<Utc>,
) -> Result<Artifact, ArtifactError> {
    let bytes = encode(format, &reviews, labels)?;
    drop(reviews);
    Ok(Artifact {
        bytes,
        filename: artifact_filename(product_name, format.extension(), now),
        content_type: content_type_for(format),
    })
}

/// Encodes one sub-file per year and packs them into a zip archive.
///
/// Consumes the per-year map so each shard's reviews and encoded
/// buffer are released as soon as the shard lands in the archive;
/// peak memory scales with one shard, not the whole job.
pub fn build_sharded(
    format: ExportFormat,
    reviews_by_year: BTreeMap<i32, Vec<AggregatedReview>>,
    labels: &[String],
    product_name: &str,
    now: DateTime<Utc>,
) -> Result<Artifact, ArtifactError> {
    let mut archive = ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (year, reviews) in reviews_by_year {
        let encoded = encode(format, &reviews, labels)?;
        drop(reviews);

        archive.start_file(format!("Avis_{}.{}", year, format.extension()), options)?;
        archive.write_all(&encoded)?;
    }

    let cursor = archive.finish()?;
    Ok(Artifact {
        bytes: cursor.into_inner(),
        filename: artifact_filename(product_name, "zip", now),
        content_type: "application/zip",
    })
}
