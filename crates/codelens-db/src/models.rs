//! Database row types. These map directly to SQLite rows and stay distinct
//! from the codelens-types models so the DB layer keeps its own shape.

use chrono::{DateTime, NaiveDateTime, Utc};
use tracing::warn;

use codelens_types::models::{CodeReview, User};

pub struct UserRow {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

pub struct ReviewRow {
    pub id: i64,
    pub title: String,
    pub code: String,
    pub language: String,
    pub review_result: Option<String>,
    pub user_id: i64,
    pub created_at: String,
}

impl UserRow {
    pub fn into_user(self) -> User {
        User {
            created_at: parse_timestamp(&self.created_at),
            id: self.id,
            username: self.username,
            email: self.email,
        }
    }
}

impl ReviewRow {
    pub fn into_review(self) -> CodeReview {
        CodeReview {
            created_at: parse_timestamp(&self.created_at),
            id: self.id,
            title: self.title,
            code: self.code,
            language: self.language,
            review_result: self.review_result,
            user_id: self.user_id,
        }
    }
}

/// SQLite's `datetime('now')` yields "YYYY-MM-DD HH:MM:SS" without a zone;
/// those are UTC. RFC 3339 strings are accepted as well.
pub fn parse_timestamp(raw: &str) -> DateTime<Utc> {
    raw.parse::<DateTime<Utc>>()
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc()))
        .unwrap_or_else(|e| {
            warn!("Corrupt timestamp '{}': {}", raw, e);
            DateTime::default()
        })
}
