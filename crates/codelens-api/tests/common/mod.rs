#![allow(dead_code)]

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

use codelens_ai::{AiGateway, TextGenerator};
use codelens_api::{AppState, AppStateInner, router};
use codelens_db::Database;

/// Generator whose upstream is never reachable.
pub struct Unreachable;

#[async_trait]
impl TextGenerator for Unreachable {
    fn provider(&self) -> &str {
        "unreachable"
    }
    fn model_name(&self) -> &str {
        "none"
    }
    async fn generate(&self, _prompt: &str) -> Result<String> {
        anyhow::bail!("connection refused")
    }
}

/// Generator that always answers with the same text.
pub struct Canned(pub String);

#[async_trait]
impl TextGenerator for Canned {
    fn provider(&self) -> &str {
        "canned"
    }
    fn model_name(&self) -> &str {
        "canned-1"
    }
    async fn generate(&self, _prompt: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

pub struct TestApp {
    pub state: AppState,
    pub app: Router,
}

pub fn build_app(generator: Arc<dyn TextGenerator>) -> TestApp {
    let db = Database::open_in_memory().expect("in-memory db should open");
    let state = AppStateInner::new(db, "test-secret".into(), AiGateway::new(generator))
        .expect("state should build");
    let app = router(state.clone());
    TestApp { state, app }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.body).expect("response should be JSON")
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// `name=value` part of the session Set-Cookie header, ready to send back.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .find(|v| v.starts_with("codelens_session="))
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

pub async fn send(
    app: &Router,
    method: &str,
    uri: &str,
    cookie: Option<&str>,
    body: Option<Value>,
) -> TestResponse {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    let body = match body {
        Some(value) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(value.to_string())
        }
        None => Body::empty(),
    };
    let req = builder.body(body).expect("request should build");

    let resp = app.clone().oneshot(req).await.expect("router is infallible");
    let status = resp.status();
    let headers = resp.headers().clone();
    let body = resp
        .into_body()
        .collect()
        .await
        .expect("body should read")
        .to_bytes()
        .to_vec();

    TestResponse {
        status,
        headers,
        body,
    }
}

pub async fn register(app: &Router, username: &str) -> TestResponse {
    send(
        app,
        "POST",
        "/register",
        None,
        Some(json!({
            "username": username,
            "email": format!("{username}@example.com"),
            "password": format!("{username}-password"),
        })),
    )
    .await
}

/// Register `username` and return its session cookie.
pub async fn sign_in(app: &Router, username: &str) -> String {
    let registered = register(app, username).await;
    assert_eq!(registered.status, StatusCode::OK, "{}", registered.text());

    let login = send(
        app,
        "POST",
        "/login",
        None,
        Some(json!({
            "username": username,
            "password": format!("{username}-password"),
        })),
    )
    .await;
    assert_eq!(login.status, StatusCode::OK, "{}", login.text());
    login.session_cookie().expect("login should set a session cookie")
}

pub async fn analyze(app: &Router, cookie: &str, path: &str, body: Value) -> TestResponse {
    send(app, "POST", path, Some(cookie), Some(body)).await
}
