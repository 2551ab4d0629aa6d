//! Reviews, answers, and the per-review aggregation the artifact
//! builder consumes.

use chrono::{DateTime, Datelike, Utc};
use std::collections::HashMap;

/// Separator used when several answers share a field label.
pub const ANSWER_JOIN_SEPARATOR: &str = " / ";

/// One field response within a review.
#[derive(Debug, Clone)]
pub struct Answer {
    pub id: i64,
    /// Human-readable question label shown as the export column.
    pub field_label: String,
    /// Stable key for the question (`satisfaction`, `verbatim`, ...).
    pub field_code: String,
    pub answer_text: Option<String>,
    /// Categorical intention classification, when present.
    pub intention: Option<String>,
    /// Parent answer for sub-questions.
    pub parent_answer_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

/// One user-submitted survey response with its answers.
#[derive(Debug, Clone)]
pub struct Review {
    pub id: i64,
    pub form_id: Option<i64>,
    pub product_id: i64,
    pub button_id: Option<i64>,
    pub xwiki_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub answers: Vec<Answer>,
}

/// A review with answers merged into a label → display-string mapping.
///
/// Derived per job and discarded after artifact assembly, never
/// persisted.
#[derive(Debug, Clone)]
pub struct AggregatedReview {
    pub id: i64,
    pub form_id: Option<i64>,
    pub product_id: i64,
    pub button_id: Option<i64>,
    pub xwiki_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub answers: HashMap<String, String>,
}

impl AggregatedReview {
    /// Merge a review's answers into one display string per label.
    ///
    /// A child answer's text is prefixed with its parent's text as
    /// `"<parent> : <child>"`; answers sharing a label are joined with
    /// `" / "` in retrieval order. A review with zero answers still
    /// yields an entry with an empty mapping.
    pub fn from_review(review: Review) -> Self {
        let parent_texts: HashMap<i64, String> = review
            .answers
            .iter()
            .filter_map(|a| a.answer_text.clone().map(|text| (a.id, text)))
            .collect();

        let mut merged: HashMap<String, String> = HashMap::new();
        for answer in &review.answers {
            let Some(text) = answer.answer_text.as_deref() else {
                continue;
            };
            let display = match answer
                .parent_answer_id
                .and_then(|pid| parent_texts.get(&pid))
            {
                Some(parent_text) => format!("{} : {}", parent_text, text),
                None => text.to_string(),
            };
            merged
                .entry(answer.field_label.clone())
                .and_modify(|existing| {
                    existing.push_str(ANSWER_JOIN_SEPARATOR);
                    existing.push_str(&display);
                })
                .or_insert(display);
        }

        AggregatedReview {
            id: review.id,
            form_id: review.form_id,
            product_id: review.product_id,
            button_id: review.button_id,
            xwiki_id: review.xwiki_id,
            created_at: review.created_at,
            answers: merged,
        }
    }

    /// Last 7 hex characters of the numeric identifier.
    ///
    /// Display shortening only, never a uniqueness key.
    pub fn short_id(&self) -> String {
        let hex = format!("{:x}", self.id);
        let start = hex.len().saturating_sub(7);
        hex[start..].to_string()
    }

    /// Calendar year of the review, used for per-year sharding.
    pub fn year(&self) -> i32 {
        self.created_at.year()
    }
}
