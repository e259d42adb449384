use std::time::Instant;

use axum::{
    Extension, Json,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
};
use tracing::info;

use codelens_ai::{AnalysisMode, build_prompt};
use codelens_db::NewReview;
use codelens_types::api::{
    AnalyzeRequest, AnalyzeResponse, DebugRequest, DebugResponse, ReviewDetail, ReviewResponse,
};

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_blocking};

pub const DEFAULT_LANGUAGE: &str = "python";
pub const DEFAULT_TITLE: &str = "Code Analysis";

const MAX_TITLE_CHARS: usize = 200;
const MAX_LANGUAGE_CHARS: usize = 50;

/// POST /api/analyze-code (and the /api/review-code alias): full analysis,
/// persisted as a review owned by the caller.
pub async fn analyze_code(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<AnalyzeRequest>, JsonRejection>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    let started = Instant::now();
    let Json(req) = payload?;

    let code = required_code(req.code)?;
    let language = field_or(req.language, DEFAULT_LANGUAGE, MAX_LANGUAGE_CHARS);
    let title = field_or(req.title, DEFAULT_TITLE, MAX_TITLE_CHARS);

    let prompt = build_prompt(&code, &language, req.error.as_deref(), AnalysisMode::Full);
    let reply = state.gateway.analyze(&prompt).await;

    let db = state.clone();
    let user_id = user.id;
    let stored_code = prompt.code;
    let result = reply.text.clone();
    let review_id = run_blocking(move || {
        db.db.insert_review(&NewReview {
            title: &title,
            code: &stored_code,
            language: &language,
            review_result: &result,
            user_id,
        })
    })
    .await?;

    let processing_time = round_secs(started.elapsed().as_secs_f64());
    info!(
        review_id,
        user_id,
        truncated = prompt.truncated,
        fallback = reply.is_fallback(),
        processing_time,
        "Code analysis stored"
    );

    Ok(Json(AnalyzeResponse {
        success: true,
        analysis: reply.text,
        review_id,
        processing_time,
    }))
}

/// POST /api/debug-code: quick fix suggestion, not persisted.
pub async fn debug_code(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    payload: Result<Json<DebugRequest>, JsonRejection>,
) -> Result<Json<DebugResponse>, ApiError> {
    let Json(req) = payload?;

    let code = required_code(req.code)?;
    let language = field_or(req.language, DEFAULT_LANGUAGE, MAX_LANGUAGE_CHARS);

    let prompt = build_prompt(&code, &language, req.error.as_deref(), AnalysisMode::Quick);
    let reply = state.gateway.analyze(&prompt).await;

    info!(user_id = user.id, fallback = reply.is_fallback(), "Quick debug served");

    Ok(Json(DebugResponse {
        success: true,
        debug_result: reply.text,
    }))
}

/// GET /api/review/{review_id}: only the owner sees a review; anyone else
/// gets the same answer as for a missing id. A non-numeric id cannot name a
/// review either.
pub async fn get_review(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    review_id: Result<Path<i64>, PathRejection>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let Ok(Path(review_id)) = review_id else {
        return Err(ApiError::NotFound("Review not found".into()));
    };

    let db = state.clone();
    let row = run_blocking(move || db.db.get_review(review_id, user.id)).await?;

    let review = row.ok_or_else(|| ApiError::NotFound("Review not found".into()))?;

    Ok(Json(ReviewResponse {
        success: true,
        review: ReviewDetail::from(review.into_review()),
    }))
}

fn required_code(code: Option<String>) -> Result<String, ApiError> {
    match code {
        Some(code) if !code.trim().is_empty() => Ok(code),
        _ => Err(ApiError::BadRequest("No code provided".into())),
    }
}

/// Trimmed value capped at `max_chars`, or `default` when blank.
fn field_or(value: Option<String>, default: &str, max_chars: usize) -> String {
    let value = value.as_deref().map(str::trim).unwrap_or("");
    if value.is_empty() {
        return default.to_string();
    }
    value.chars().take(max_chars).collect()
}

fn round_secs(secs: f64) -> f64 {
    (secs * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_fields_take_defaults() {
        assert_eq!(field_or(None, DEFAULT_LANGUAGE, 50), "python");
        assert_eq!(field_or(Some("  ".into()), DEFAULT_TITLE, 200), "Code Analysis");
        assert_eq!(field_or(Some(" rust ".into()), DEFAULT_LANGUAGE, 50), "rust");
    }

    #[test]
    fn long_fields_are_capped() {
        let title = field_or(Some("t".repeat(300)), DEFAULT_TITLE, MAX_TITLE_CHARS);
        assert_eq!(title.chars().count(), MAX_TITLE_CHARS);
    }

    #[test]
    fn code_must_be_present() {
        assert!(required_code(None).is_err());
        assert!(required_code(Some(" \n".into())).is_err());
        assert_eq!(required_code(Some("x = 1".into())).unwrap(), "x = 1");
    }

    #[test]
    fn processing_time_has_two_decimals() {
        assert_eq!(round_secs(1.23456), 1.23);
        assert_eq!(round_secs(0.005), 0.01);
    }
}
