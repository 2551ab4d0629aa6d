//! Spreadsheet encoding of aggregated reviews.
//!
//! The workbook mirrors the CSV layout but adds the presentation the
//! flat format cannot carry: a bold shaded header, wrapped cells,
//! column widths sized to content, and multi-valued answers rendered
//! as bullet lines instead of a separator-joined string.

use domain::models::{AggregatedReview, ANSWER_JOIN_SEPARATOR};
use rust_xlsxwriter::{Color, Format, Workbook};

use super::{ArtifactError, FIXED_COLUMNS};

/// Characters per column before text wraps; also the column width cap.
const WRAP_WIDTH: usize = 60;

/// Minimum column width so short columns stay readable.
const MIN_COLUMN_WIDTH: f64 = 12.0;

/// Default worksheet row height in points.
const LINE_HEIGHT: f64 = 15.0;

pub fn encode_xlsx(
    reviews: &[AggregatedReview],
    labels: &[String],
) -> Result<Vec<u8>, ArtifactError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name("Avis")?;

    let header_format = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xD9D9D9));
    let cell_format = Format::new().set_text_wrap();

    let mut header: Vec<&str> = FIXED_COLUMNS.to_vec();
    header.extend(labels.iter().map(String::as_str));

    let mut column_widths: Vec<usize> = header.iter().map(|h| h.len()).collect();

    for (col, title) in header.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }

    for (idx, review) in reviews.iter().enumerate() {
        let row = (idx + 1) as u32;
        let mut max_lines = 1usize;

        let mut cells = Vec::with_capacity(header.len());
        cells.push(review.short_id());
        cells.push(opt_id(review.form_id));
        cells.push(review.product_id.to_string());
        cells.push(opt_id(review.button_id));
        cells.push(opt_id(review.xwiki_id));
        cells.push(review.created_at.format("%Y-%m-%d %H:%M:%S").to_string());
        for label in labels {
            let raw = review.answers.get(label).cloned().unwrap_or_default();
            cells.push(bulletize(&raw));
        }

        for (col, value) in cells.iter().enumerate() {
            max_lines = max_lines.max(wrapped_line_count(value));
            column_widths[col] = column_widths[col].max(longest_line(value));
            worksheet.write_string_with_format(row, col as u16, value, &cell_format)?;
        }

        if max_lines > 1 {
            worksheet.set_row_height(row, max_lines as f64 * LINE_HEIGHT)?;
        }
    }

    for (col, width) in column_widths.iter().enumerate() {
        let width = (*width as f64 + 2.0).clamp(MIN_COLUMN_WIDTH, WRAP_WIDTH as f64);
        worksheet.set_column_width(col as u16, width)?;
    }

    Ok(workbook.save_to_buffer()?)
}

fn opt_id(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Multi-valued answers become one bullet line per value.
fn bulletize(value: &str) -> String {
    if !value.contains(ANSWER_JOIN_SEPARATOR) {
        return value.to_string();
    }
    value
        .split(ANSWER_JOIN_SEPARATOR)
        .map(|part| format!("• {}", part))
        .collect::<Vec<_>>()
        .join("\n")
}

fn longest_line(value: &str) -> usize {
    value.lines().map(|l| l.chars().count()).max().unwrap_or(0)
}

/// Lines the cell occupies once wrapped at the column width.
fn wrapped_line_count(value: &str) -> usize {
    value
        .lines()
        .map(|line| {
            let chars = line.chars().count();
            (chars.max(1) + WRAP_WIDTH - 1) / WRAP_WIDTH
        })
        .sum::<usize>()
        .max(1)
}
