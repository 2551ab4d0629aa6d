//! Review and answer entities.

use chrono::{DateTime, Utc};
use domain::models::{Answer, Review};
use sqlx::FromRow;

/// One review row, without its answers.
#[derive(Debug, Clone, FromRow)]
pub struct ReviewEntity {
    pub id: i32,
    pub form_id: Option<i32>,
    pub product_id: i32,
    pub button_id: Option<i32>,
    pub xwiki_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl ReviewEntity {
    /// Builds the domain review with its matched answers attached.
    pub fn into_domain(self, answers: Vec<Answer>) -> Review {
        Review {
            id: i64::from(self.id),
            form_id: self.form_id.map(i64::from),
            product_id: i64::from(self.product_id),
            button_id: self.button_id.map(i64::from),
            xwiki_id: self.xwiki_id.map(i64::from),
            created_at: self.created_at,
            answers,
        }
    }
}

/// One answer row.
#[derive(Debug, Clone, FromRow)]
pub struct AnswerEntity {
    pub id: i32,
    pub review_id: i32,
    pub field_label: String,
    pub field_code: String,
    pub answer_text: Option<String>,
    pub intention: Option<String>,
    pub parent_answer_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl AnswerEntity {
    pub fn into_domain(self) -> Answer {
        Answer {
            id: i64::from(self.id),
            field_label: self.field_label,
            field_code: self.field_code,
            answer_text: self.answer_text,
            intention: self.intention,
            parent_answer_id: self.parent_answer_id.map(i64::from),
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_review_entity_into_domain() {
        let entity = ReviewEntity {
            id: 17,
            form_id: Some(2),
            product_id: 42,
            button_id: None,
            xwiki_id: Some(9),
            created_at: Utc::now(),
        };
        let review = entity.into_domain(vec![]);
        assert_eq!(review.id, 17);
        assert_eq!(review.product_id, 42);
        assert!(review.button_id.is_none());
        assert!(review.answers.is_empty());
    }
}
