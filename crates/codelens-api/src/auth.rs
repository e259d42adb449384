use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier,
    password_hash::{SaltString, rand_core::OsRng},
};
use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
    response::{IntoResponse, Redirect},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use tracing::{info, warn};
use uuid::Uuid;

use codelens_db::{Database, UserInsert};
use codelens_types::api::{Claims, LoginRequest, MessageResponse, RegisterRequest};
use codelens_types::models::User;

use crate::error::ApiError;
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_blocking};

pub const SESSION_COOKIE: &str = "codelens_session";

const MAX_USERNAME_CHARS: usize = 80;
const MAX_EMAIL_CHARS: usize = 120;

// -- Credential store --

pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))?
        .to_string();
    Ok(hash)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(stored_hash) else {
        warn!("Stored password hash is not a valid PHC string");
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

pub fn register_user(db: &Database, username: &str, email: &str, password: &str) -> anyhow::Result<UserInsert> {
    // Skip the hashing cost for names we already know are taken.
    if db.get_user_by_username(username)?.is_some() {
        return Ok(UserInsert::UsernameTaken);
    }
    if db.get_user_by_email(email)?.is_some() {
        return Ok(UserInsert::EmailTaken);
    }
    let password_hash = hash_password(password)?;
    db.insert_user(username, email, &password_hash)
}

/// `None` for an unknown username and for a wrong password alike.
pub fn authenticate(db: &Database, username: &str, password: &str) -> anyhow::Result<Option<User>> {
    let Some(row) = db.get_user_by_username(username)? else {
        return Ok(None);
    };
    if !verify_password(password, &row.password_hash) {
        return Ok(None);
    }
    Ok(Some(row.into_user()))
}

fn validate_registration(req: &RegisterRequest) -> Result<(String, String), ApiError> {
    let username = req.username.trim();
    let email = req.email.trim();

    if username.is_empty() || email.is_empty() || req.password.is_empty() {
        return Err(ApiError::Validation(
            "Username, email and password are required".into(),
        ));
    }
    if username.chars().count() > MAX_USERNAME_CHARS {
        return Err(ApiError::Validation(format!(
            "Username must be at most {MAX_USERNAME_CHARS} characters"
        )));
    }
    if email.chars().count() > MAX_EMAIL_CHARS || !email.contains('@') {
        return Err(ApiError::Validation("Email address is not valid".into()));
    }

    Ok((username.to_string(), email.to_string()))
}

// -- Session tokens --

pub fn create_token(secret: &str, user_id: i64, username: &str, session_id: &str) -> anyhow::Result<String> {
    let claims = Claims {
        sub: user_id,
        username: username.to_string(),
        sid: session_id.to_string(),
        exp: (chrono::Utc::now() + chrono::Duration::days(30)).timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?;

    Ok(token)
}

pub fn decode_token(secret: &str, token: &str) -> anyhow::Result<Claims> {
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )?;
    Ok(data.claims)
}

fn session_cookie(token: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}

// -- Handlers --

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(req) = payload?;
    let (username, email) = validate_registration(&req)?;

    let db = state.clone();
    let name = username.clone();
    let outcome =
        run_blocking(move || register_user(&db.db, &name, &email, &req.password)).await?;

    match outcome {
        UserInsert::Created(user_id) => {
            info!(user_id, username = %username, "User registered");
            Ok(Json(MessageResponse::ok("Registration successful")))
        }
        UserInsert::UsernameTaken => Err(ApiError::Conflict("Username already exists".into())),
        UserInsert::EmailTaken => Err(ApiError::Conflict("Email already registered".into())),
    }
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<(CookieJar, Json<MessageResponse>), ApiError> {
    let Json(req) = payload?;

    // Usernames are stored trimmed at registration.
    let username = req.username.trim().to_string();

    let db = state.clone();
    let name = username.clone();
    let password = req.password;
    let user = run_blocking(move || authenticate(&db.db, &name, &password)).await?;

    let Some(user) = user else {
        warn!(username = %username, "Rejected login attempt");
        return Err(ApiError::Unauthorized("Invalid credentials".into()));
    };

    let session_id = Uuid::new_v4().to_string();
    let db = state.clone();
    let sid = session_id.clone();
    let user_id = user.id;
    run_blocking(move || db.db.create_session(&sid, user_id)).await?;

    let token = create_token(&state.session_secret, user.id, &user.username, &session_id)?;

    info!(user_id = user.id, username = %user.username, "User logged in");
    Ok((
        jar.add(session_cookie(token)),
        Json(MessageResponse::ok("Login successful")),
    ))
}

pub async fn logout(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    jar: CookieJar,
) -> Result<impl IntoResponse, ApiError> {
    let db = state.clone();
    let sid = user.session_id.clone();
    run_blocking(move || db.db.delete_session(&sid)).await?;

    info!(user_id = user.id, "User logged out");
    Ok((
        jar.remove(Cookie::build(SESSION_COOKIE).path("/")),
        Redirect::to("/"),
    ))
}
