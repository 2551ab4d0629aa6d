//! CSV encoding of aggregated reviews.

use domain::models::AggregatedReview;

use super::{ArtifactError, FIXED_COLUMNS};

/// Encodes reviews as UTF-8 CSV with the fixed identity columns
/// followed by one column per discovered answer label, in the order
/// the caller resolved them.
pub fn encode_csv(
    reviews: &[AggregatedReview],
    labels: &[String],
) -> Result<Vec<u8>, ArtifactError> {
    let mut buf = Vec::new();
    {
        let mut writer = csv::Writer::from_writer(&mut buf);

        let mut header: Vec<&str> = FIXED_COLUMNS.to_vec();
        header.extend(labels.iter().map(String::as_str));
        writer.write_record(&header)?;

        for review in reviews {
            let mut record = Vec::with_capacity(header.len());
            record.push(review.short_id());
            record.push(opt_id(review.form_id));
            record.push(review.product_id.to_string());
            record.push(opt_id(review.button_id));
            record.push(opt_id(review.xwiki_id));
            record.push(review.created_at.format("%Y-%m-%d %H:%M:%S").to_string());
            for label in labels {
                record.push(review.answers.get(label).cloned().unwrap_or_default());
            }
            writer.write_record(&record)?;
        }

        writer.flush()?;
    }
    Ok(buf)
}

fn opt_id(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}
