use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use codelens_types::api::{ErrorResponse, MessageResponse};

/// Handler error. Every variant renders as a `{success: false, ...}` JSON
/// envelope: user-facing rejections carry `message`, everything else `error`.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        match self {
            Self::Validation(message) | Self::Conflict(message) | Self::Unauthorized(message) => {
                (status, Json(MessageResponse::rejected(message))).into_response()
            }
            other => {
                if let Self::Internal(e) = &other {
                    error!("Request failed: {:#}", e);
                }
                let body = ErrorResponse {
                    success: false,
                    error: other.to_string(),
                };
                (status, Json(body)).into_response()
            }
        }
    }
}
