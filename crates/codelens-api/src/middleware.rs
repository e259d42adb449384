use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use tracing::debug;

use crate::auth::{SESSION_COOKIE, decode_token};
use crate::error::ApiError;
use crate::state::{AppState, run_blocking};

/// The authenticated caller, inserted into request extensions by the gates
/// below.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    pub session_id: String,
}

/// Resolve the session cookie to a live session. A missing, forged, expired
/// or logged-out token resolves to `None`.
pub async fn resolve_session(state: &AppState, jar: &CookieJar) -> Result<Option<CurrentUser>, ApiError> {
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    let claims = match decode_token(&state.session_secret, cookie.value()) {
        Ok(claims) => claims,
        Err(e) => {
            debug!("Ignoring invalid session cookie: {}", e);
            return Ok(None);
        }
    };

    let db = state.clone();
    let sid = claims.sid.clone();
    let user_id = claims.sub;
    let live = run_blocking(move || db.db.session_exists(&sid, user_id)).await?;

    Ok(live.then(|| CurrentUser {
        id: claims.sub,
        username: claims.username,
        session_id: claims.sid,
    }))
}

/// Gate for JSON API routes: unauthenticated requests get a bare 401.
pub async fn require_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    match resolve_session(&state, &jar).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            Ok(next.run(req).await)
        }
        Ok(None) => Err(StatusCode::UNAUTHORIZED),
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Gate for browser pages: unauthenticated requests are sent to the login
/// page.
pub async fn require_page_session(
    State(state): State<AppState>,
    jar: CookieJar,
    mut req: Request,
    next: Next,
) -> Response {
    match resolve_session(&state, &jar).await {
        Ok(Some(user)) => {
            req.extensions_mut().insert(user);
            next.run(req).await
        }
        Ok(None) => Redirect::to("/login").into_response(),
        Err(e) => e.into_response(),
    }
}
