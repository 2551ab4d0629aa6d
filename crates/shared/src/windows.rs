//! Calendar-month window splitting.
//!
//! A requested date range is split into per-month sub-windows so each
//! window can be paginated independently with offsets restarting at
//! zero. This bounds the worst-case offset cost of a large export to
//! one month of rows instead of the whole range.

use chrono::{Datelike, NaiveDate};

/// One inclusive calendar-month sub-window of a requested range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Splits `[start, end]` into calendar-month windows, clipped to the
/// range bounds. An inverted range yields no windows.
pub fn month_windows(start: NaiveDate, end: NaiveDate) -> Vec<MonthWindow> {
    let mut windows = Vec::new();
    let mut cursor = start;

    while cursor <= end {
        let month_end = last_day_of_month(cursor);
        windows.push(MonthWindow {
            start: cursor,
            end: month_end.min(end),
        });
        cursor = match month_end.succ_opt() {
            Some(next) => next,
            None => break,
        };
    }

    windows
}

fn last_day_of_month(date: NaiveDate) -> NaiveDate {
    let first_of_next = if date.month() == 12 {
        NaiveDate::from_ymd_opt(date.year() + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(date.year(), date.month() + 1, 1)
    };
    first_of_next
        .and_then(|d| d.pred_opt())
        .expect("month end is always representable")
}
