use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// -- Session claims --

/// Claims carried by the session cookie. `sid` names the server-side session
/// row; the token is only honoured while that row exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub username: String,
    pub sid: String,
    pub exp: usize,
}

// -- Auth --

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// `{success, message}` envelope used by the register and login endpoints.
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// -- Analysis --

/// Body of `/api/analyze-code` and its `/api/review-code` alias. Missing
/// optional fields fall back to defaults in the handler.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AnalyzeRequest {
    pub code: Option<String>,
    pub language: Option<String>,
    pub title: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    /// JSON text, either the model's answer or the fallback payload.
    pub analysis: String,
    pub review_id: i64,
    /// Seconds, rounded to two decimals.
    pub processing_time: f64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct DebugRequest {
    pub code: Option<String>,
    pub language: Option<String>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DebugResponse {
    pub success: bool,
    pub debug_result: String,
}

// -- Reviews --

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReviewDetail {
    pub id: i64,
    pub title: String,
    pub code: String,
    pub language: String,
    pub result: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReviewResponse {
    pub success: bool,
    pub review: ReviewDetail,
}

// -- Errors --

/// `{success: false, error}` envelope for not-found and unexpected failures.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
