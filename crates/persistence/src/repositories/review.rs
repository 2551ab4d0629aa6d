//! Read-only access to the review/answer store.
//!
//! Queries are windowed and paginated by the caller; this repository
//! never holds more than one page of rows. Answers are joined loosely
//! by a ±1-day window around their owning review's creation timestamp
//! rather than a strict foreign-key equality, to tolerate clock skew
//! between review and answer writes.

use chrono::{DateTime, NaiveDate, Utc};
use domain::models::ExportParams;
use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::entities::{AnswerEntity, ReviewEntity};

/// Repository for review and answer read queries.
#[derive(Clone)]
pub struct ReviewRepository {
    pool: PgPool,
}

impl ReviewRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Total matched reviews for the job's full range and filters.
    ///
    /// Drives the progress math and the sharding decision before any
    /// page is read.
    pub async fn count_reviews(
        &self,
        product_id: i32,
        params: &ExportParams,
    ) -> Result<i64, sqlx::Error> {
        let (from, to) = day_bounds(params.start_date, params.end_date);

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"SELECT COUNT(*) FROM public."Review" r WHERE r.product_id = "#,
        );
        qb.push_bind(product_id);
        qb.push(" AND r.created_at BETWEEN ");
        qb.push_bind(from);
        qb.push(" AND ");
        qb.push_bind(to);
        push_filter_predicates(&mut qb, params);

        qb.build_query_scalar().fetch_one(&self.pool).await
    }

    /// One page of reviews inside a window, newest first.
    ///
    /// Offsets restart at zero per window, so the worst-case offset
    /// cost is bounded by one month of rows.
    pub async fn fetch_page(
        &self,
        product_id: i32,
        window_start: NaiveDate,
        window_end: NaiveDate,
        params: &ExportParams,
        page_size: i64,
        offset: i64,
    ) -> Result<Vec<ReviewEntity>, sqlx::Error> {
        let (from, to) = day_bounds(window_start, window_end);

        let mut qb = QueryBuilder::<Postgres>::new(
            r#"SELECT r.id, r.form_id, r.product_id, r.button_id, r.xwiki_id, r.created_at
               FROM public."Review" r WHERE r.product_id = "#,
        );
        qb.push_bind(product_id);
        qb.push(" AND r.created_at BETWEEN ");
        qb.push_bind(from);
        qb.push(" AND ");
        qb.push_bind(to);
        push_filter_predicates(&mut qb, params);
        qb.push(" ORDER BY r.created_at DESC LIMIT ");
        qb.push_bind(page_size);
        qb.push(" OFFSET ");
        qb.push_bind(offset);

        qb.build_query_as().fetch_all(&self.pool).await
    }

    /// All answers for a page of review identifiers, in one batched
    /// query. Each answer is kept only when its creation timestamp
    /// falls within ±1 day of its own review's creation timestamp.
    pub async fn fetch_answers(
        &self,
        review_ids: &[i32],
    ) -> Result<Vec<AnswerEntity>, sqlx::Error> {
        if review_ids.is_empty() {
            return Ok(Vec::new());
        }

        sqlx::query_as::<_, AnswerEntity>(ANSWER_QUERY)
            .bind(review_ids)
            .fetch_all(&self.pool)
            .await
    }
}

/// The ±1-day bound is relative to the owning review, never to the
/// extraction window.
const ANSWER_QUERY: &str = r#"
    SELECT a.id, a.review_id, a.field_label, a.field_code,
           a.answer_text, a.intention::text AS intention,
           a.parent_answer_id, a.created_at
    FROM public."Answer" a
    JOIN public."Review" r ON r.id = a.review_id
    WHERE a.review_id = ANY($1)
      AND a.created_at BETWEEN r.created_at - INTERVAL '1 day'
                           AND r.created_at + INTERVAL '1 day'
    ORDER BY a.id ASC
"#;

/// Inclusive day bounds as UTC timestamps.
fn day_bounds(start: NaiveDate, end: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let from = start
        .and_hms_opt(0, 0, 0)
        .expect("midnight is representable")
        .and_utc();
    let to = end
        .and_hms_opt(23, 59, 59)
        .expect("end of day is representable")
        .and_utc();
    (from, to)
}

/// Appends the EXISTS predicates derived from the parsed filters.
///
/// Mirrors the submitting application's query semantics: satisfaction
/// matches answer intentions on the `satisfaction` field code,
/// comprehension matches answer texts, `needVerbatim` is a presence
/// check, and `search` is a case-insensitive substring match on
/// verbatim answers.
fn push_filter_predicates(qb: &mut QueryBuilder<'_, Postgres>, params: &ExportParams) {
    if !params.filters.satisfaction.is_empty() {
        qb.push(
            r#" AND EXISTS (SELECT 1 FROM public."Answer" a
                WHERE a.review_id = r.id
                  AND a.field_code = 'satisfaction'
                  AND a.intention::text = ANY("#,
        );
        qb.push_bind(params.filters.satisfaction.clone());
        qb.push("))");
    }

    if !params.filters.comprehension.is_empty() {
        qb.push(
            r#" AND EXISTS (SELECT 1 FROM public."Answer" a
                WHERE a.review_id = r.id
                  AND a.field_code = 'comprehension'
                  AND a.answer_text = ANY("#,
        );
        qb.push_bind(params.filters.comprehension.clone());
        qb.push("))");
    }

    if params.filters.need_verbatim {
        qb.push(
            r#" AND EXISTS (SELECT 1 FROM public."Answer" a
                WHERE a.review_id = r.id AND a.field_code = 'verbatim')"#,
        );
    }

    if let Some(search) = &params.search {
        qb.push(
            r#" AND EXISTS (SELECT 1 FROM public."Answer" a
                WHERE a.review_id = r.id
                  AND a.field_code = 'verbatim'
                  AND a.answer_text ILIKE "#,
        );
        qb.push_bind(format!("%{}%", search));
        qb.push(")");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::ReviewFilters;

    fn params_with(filters: ReviewFilters, search: Option<&str>) -> ExportParams {
        ExportParams {
            search: search.map(String::from),
            start_date: NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2023, 12, 31).unwrap(),
            filters,
        }
    }

    #[test]
    fn test_answer_bound_is_relative_to_owning_review() {
        assert!(ANSWER_QUERY.contains(r#"r.created_at - INTERVAL '1 day'"#));
        assert!(ANSWER_QUERY.contains(r#"r.created_at + INTERVAL '1 day'"#));
        assert!(ANSWER_QUERY.contains(r#"JOIN public."Review" r"#));
    }

    #[test]
    fn test_day_bounds_cover_whole_days() {
        let (from, to) = day_bounds(
            NaiveDate::from_ymd_opt(2023, 3, 1).unwrap(),
            NaiveDate::from_ymd_opt(2023, 3, 31).unwrap(),
        );
        assert_eq!(from.to_rfc3339(), "2023-03-01T00:00:00+00:00");
        assert_eq!(to.to_rfc3339(), "2023-03-31T23:59:59+00:00");
    }

    #[test]
    fn test_no_filters_adds_no_predicates() {
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1");
        push_filter_predicates(&mut qb, &params_with(ReviewFilters::default(), None));
        assert_eq!(qb.sql(), "SELECT 1");
    }

    #[test]
    fn test_all_filters_add_exists_predicates() {
        let filters = ReviewFilters {
            satisfaction: vec!["good".to_string()],
            comprehension: vec!["3".to_string()],
            need_verbatim: true,
        };
        let mut qb = QueryBuilder::<Postgres>::new("SELECT 1");
        push_filter_predicates(&mut qb, &params_with(filters, Some("impots")));

        let sql = qb.sql();
        assert_eq!(sql.matches("EXISTS").count(), 4);
        assert!(sql.contains("a.field_code = 'satisfaction'"));
        assert!(sql.contains("a.field_code = 'comprehension'"));
        assert!(sql.contains("ILIKE"));
    }
}
