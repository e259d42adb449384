use axum::{
    Extension,
    extract::State,
    response::{Html, IntoResponse, Response},
};
use axum_extra::extract::cookie::CookieJar;
use serde::Serialize;
use tera::{Context, Tera};

use codelens_types::models::CodeReview;

use crate::error::ApiError;
use crate::middleware::{CurrentUser, resolve_session};
use crate::state::{AppState, run_blocking};

const DASHBOARD_RECENT: u32 = 5;

/// Templates are compiled into the binary so the server has no runtime
/// asset directory.
pub fn templates() -> anyhow::Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../templates/base.html")),
        ("index.html", include_str!("../templates/index.html")),
        ("dashboard.html", include_str!("../templates/dashboard.html")),
        ("auth.html", include_str!("../templates/auth.html")),
        ("review.html", include_str!("../templates/review.html")),
        ("history.html", include_str!("../templates/history.html")),
    ])?;
    Ok(tera)
}

/// Row shown in the dashboard and history lists.
#[derive(Debug, Serialize)]
struct ReviewListItem {
    id: i64,
    title: String,
    language: String,
    created_at: String,
}

impl From<CodeReview> for ReviewListItem {
    fn from(review: CodeReview) -> Self {
        Self {
            id: review.id,
            title: review.title,
            language: review.language,
            created_at: review.created_at.format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

fn render(state: &AppState, name: &str, context: &Context) -> Result<Html<String>, ApiError> {
    let page = state
        .templates
        .render(name, context)
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("rendering {} failed: {:?}", name, e)))?;
    Ok(Html(page))
}

async fn reviews_for(state: &AppState, user_id: i64, limit: Option<u32>) -> Result<Vec<ReviewListItem>, ApiError> {
    let db = state.clone();
    let rows = run_blocking(move || db.db.list_reviews_by_owner(user_id, limit)).await?;
    Ok(rows
        .into_iter()
        .map(|row| ReviewListItem::from(row.into_review()))
        .collect())
}

/// GET /: dashboard for a signed-in user, landing page otherwise.
pub async fn index(State(state): State<AppState>, jar: CookieJar) -> Result<Response, ApiError> {
    let mut context = Context::new();

    let Some(user) = resolve_session(&state, &jar).await? else {
        return Ok(render(&state, "index.html", &context)?.into_response());
    };

    context.insert("username", &user.username);
    context.insert("reviews", &reviews_for(&state, user.id, Some(DASHBOARD_RECENT)).await?);
    Ok(render(&state, "dashboard.html", &context)?.into_response())
}

pub async fn register_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let mut context = Context::new();
    context.insert("mode", "register");
    render(&state, "auth.html", &context)
}

pub async fn login_page(State(state): State<AppState>) -> Result<Html<String>, ApiError> {
    let mut context = Context::new();
    context.insert("mode", "login");
    render(&state, "auth.html", &context)
}

pub async fn review_page(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, ApiError> {
    let mut context = Context::new();
    context.insert("username", &user.username);
    render(&state, "review.html", &context)
}

pub async fn history(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Html<String>, ApiError> {
    let mut context = Context::new();
    context.insert("username", &user.username);
    context.insert("reviews", &reviews_for(&state, user.id, None).await?);
    render(&state, "history.html", &context)
}
