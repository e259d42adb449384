use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::middleware::{require_page_session, require_session};
use crate::state::AppState;
use crate::{auth, pages, reviews};

/// Full HTTP surface. Transport layers (tracing, body limits) are added by
/// the binary.
pub fn router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/", get(pages::index))
        .route("/register", get(pages::register_page).post(auth::register))
        .route("/login", get(pages::login_page).post(auth::login))
        .route("/health", get(health));

    let page_routes = Router::new()
        .route("/logout", get(auth::logout))
        .route("/review", get(pages::review_page))
        .route("/history", get(pages::history))
        .layer(middleware::from_fn_with_state(state.clone(), require_page_session));

    let api_routes = Router::new()
        .route("/api/analyze-code", post(reviews::analyze_code))
        .route("/api/review-code", post(reviews::analyze_code))
        .route("/api/debug-code", post(reviews::debug_code))
        .route("/api/review/{review_id}", get(reviews::get_review))
        .layer(middleware::from_fn_with_state(state.clone(), require_session));

    Router::new()
        .merge(public_routes)
        .merge(page_routes)
        .merge(api_routes)
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}
