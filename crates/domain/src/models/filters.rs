//! Filter specification embedded in the export job row.
//!
//! The submitting application stores a free-form JSON blob in the
//! `params` column. Parsing fails closed: malformed JSON or unusable
//! values degrade to the defaults instead of failing the job, and
//! unknown keys are ignored.

use chrono::NaiveDate;
use serde::Deserialize;
use tracing::warn;

/// Default lower bound when the submitter gives no start date.
pub const DEFAULT_START_DATE: &str = "2018-01-01";

/// Categorical answer filters recognized by the export query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ReviewFilters {
    /// Intention values matched on the `satisfaction` field code.
    #[serde(default)]
    pub satisfaction: Vec<String>,

    /// Answer texts matched on the `comprehension` field code.
    #[serde(default)]
    pub comprehension: Vec<String>,

    /// Keep only reviews carrying a `verbatim` answer.
    #[serde(default, rename = "needVerbatim")]
    pub need_verbatim: bool,
}

impl ReviewFilters {
    pub fn is_empty(&self) -> bool {
        self.satisfaction.is_empty() && self.comprehension.is_empty() && !self.need_verbatim
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawParams {
    #[serde(default)]
    search: Option<String>,
    #[serde(default, rename = "startDate")]
    start_date: Option<String>,
    #[serde(default, rename = "endDate")]
    end_date: Option<String>,
    #[serde(default)]
    filters: ReviewFilters,
}

/// Parsed, closed representation of the job's filter specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportParams {
    /// Free-text search, matched case-insensitively against verbatim
    /// answers.
    pub search: Option<String>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub filters: ReviewFilters,
}

impl ExportParams {
    /// Parse the raw `params` column. `today` supplies the default end
    /// date so callers (and tests) control the clock.
    pub fn parse(raw: Option<&str>, today: NaiveDate) -> Self {
        let raw_params = match raw {
            Some(text) if !text.trim().is_empty() => {
                match serde_json::from_str::<RawParams>(text) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        warn!(error = %e, "Malformed export params JSON, ignoring filters");
                        RawParams::default()
                    }
                }
            }
            _ => RawParams::default(),
        };

        let start_date = raw_params
            .start_date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or_else(default_start_date);
        let end_date = raw_params
            .end_date
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(today);

        ExportParams {
            search: raw_params.search.filter(|s| !s.trim().is_empty()),
            start_date,
            end_date,
            filters: raw_params.filters,
        }
    }
}

fn default_start_date() -> NaiveDate {
    DEFAULT_START_DATE
        .parse()
        .expect("default start date is valid")
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_date(s: &str) -> Option<NaiveDate> {
    if let Ok(date) = s.parse::<NaiveDate>() {
        return Some(date);
    }
    chrono::DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn test_parse_full_params() {
        let raw = r#"{
            "search": "impots",
            "startDate": "2023-01-01",
            "endDate": "2023-12-31",
            "filters": {
                "satisfaction": ["good", "bad"],
                "comprehension": ["3"],
                "needVerbatim": true
            }
        }"#;
        let params = ExportParams::parse(Some(raw), today());

        assert_eq!(params.search.as_deref(), Some("impots"));
        assert_eq!(params.start_date.to_string(), "2023-01-01");
        assert_eq!(params.end_date.to_string(), "2023-12-31");
        assert_eq!(params.filters.satisfaction, vec!["good", "bad"]);
        assert_eq!(params.filters.comprehension, vec!["3"]);
        assert!(params.filters.need_verbatim);
    }

    #[test]
    fn test_malformed_json_falls_back_to_defaults() {
        let params = ExportParams::parse(Some("{not json"), today());
        assert!(params.search.is_none());
        assert_eq!(params.start_date.to_string(), DEFAULT_START_DATE);
        assert_eq!(params.end_date, today());
        assert!(params.filters.is_empty());
    }

    #[test]
    fn test_missing_params_uses_defaults() {
        let params = ExportParams::parse(None, today());
        assert_eq!(params.start_date.to_string(), DEFAULT_START_DATE);
        assert_eq!(params.end_date, today());
        assert!(params.filters.is_empty());
    }

    #[test]
    fn test_unknown_keys_are_ignored() {
        let raw = r#"{"search": "x", "unknown": 42, "filters": {"extra": true}}"#;
        let params = ExportParams::parse(Some(raw), today());
        assert_eq!(params.search.as_deref(), Some("x"));
        assert!(params.filters.is_empty());
    }

    #[test]
    fn test_rfc3339_dates_accepted() {
        let raw = r#"{"startDate": "2023-05-10T00:00:00.000Z"}"#;
        let params = ExportParams::parse(Some(raw), today());
        assert_eq!(params.start_date.to_string(), "2023-05-10");
    }

    #[test]
    fn test_blank_search_is_dropped() {
        let raw = r#"{"search": "   "}"#;
        let params = ExportParams::parse(Some(raw), today());
        assert!(params.search.is_none());
    }
}
