use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::ReviewDetail;

/// A registered account. The password hash never leaves the DB layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// One persisted analysis request and its result. Immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodeReview {
    pub id: i64,
    pub title: String,
    pub code: String,
    pub language: String,
    pub review_result: Option<String>,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
}

impl From<CodeReview> for ReviewDetail {
    fn from(review: CodeReview) -> Self {
        ReviewDetail {
            id: review.id,
            title: review.title,
            code: review.code,
            language: review.language,
            result: review.review_result,
            created_at: review.created_at,
        }
    }
}
