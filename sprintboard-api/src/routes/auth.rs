/// Authentication endpoints
///
/// - `POST /v1/auth/register`: create an account (or claim an invited one)
/// - `POST /v1/auth/login`: exchange credentials for tokens
/// - `POST /v1/auth/refresh`: exchange a refresh token for an access token
/// - `POST /v1/auth/logout`: clear the session cookie
/// - `GET  /v1/auth/me`: the current user
///
/// Register and login return the token pair in the body and also set the
/// access token as an HTTP-only `token` cookie for browser clients.

use crate::{
    app::{AppState, SESSION_COOKIE},
    error::{ApiError, ApiResult},
};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use sprintboard_shared::{
    auth::{
        identity::CurrentUser,
        jwt::{self, TokenPair},
        password,
    },
    models::user::{CreateUser, User},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Checked by `validate_password_strength`
    pub password: String,

    #[validate(length(max = 100, message = "Name must be at most 100 characters"))]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub user: CurrentUser,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_in: i64,
}

/// Lowercased, trimmed email used for every lookup and insert
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure)
        .path("/")
        .build()
}

fn clear_session_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").removal().build()
}

/// Register a new account
///
/// ```text
/// POST /v1/auth/register
///
/// { "email": "ada@example.com", "password": "hunter22", "name": "Ada" }
/// ```
///
/// If the email belongs to an invited placeholder account, that account is
/// claimed and keeps its project memberships. Ownership of the address is not
/// verified: whoever registers an invited email first gets its memberships.
///
/// # Errors
///
/// - `400 Bad Request`: malformed body
/// - `409 Conflict`: email already registered
/// - `422 Unprocessable Entity`: invalid email, name or weak password
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, CookieJar, Json<SessionResponse>)> {
    let Json(req) = payload?;
    req.validate()?;
    password::validate_password_strength(&req.password)?;

    let email = normalize_email(&req.email);
    let name = req
        .name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());
    let password_hash = password::hash_password(&req.password)?;

    let user = match state.store.find_user_by_email(&email).await? {
        Some(existing) if existing.is_placeholder() => {
            tracing::info!(user_id = %existing.id, "Claiming invited account");
            state
                .store
                .claim_user(existing.id, &password_hash, name)
                .await?
                .ok_or_else(email_taken)?
        }
        Some(_) => return Err(email_taken()),
        None => {
            state
                .store
                .create_user(CreateUser {
                    email,
                    password_hash: Some(password_hash),
                    name,
                    image: None,
                })
                .await?
        }
    };

    tracing::info!(user_id = %user.id, "User registered");

    let (jar, response) = start_session(&state, jar, user)?;
    Ok((StatusCode::CREATED, jar, response))
}

/// Log in with email and password
///
/// # Errors
///
/// - `401 Unauthorized`: unknown email, wrong password, or an invited account
///   that has not registered yet
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<SessionResponse>)> {
    let Json(req) = payload?;
    req.validate()?;

    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = state
        .store
        .find_user_by_email(&normalize_email(&req.email))
        .await?
        .ok_or_else(invalid)?;

    let Some(hash) = user.password_hash.as_deref() else {
        return Err(invalid());
    };

    if !password::verify_password(&req.password, hash)? {
        tracing::debug!(user_id = %user.id, "Failed login attempt");
        return Err(invalid());
    }

    start_session(&state, jar, user)
}

/// Exchange a refresh token for a new access token
///
/// # Errors
///
/// - `401 Unauthorized`: invalid/expired refresh token, or the user is gone
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> ApiResult<Json<RefreshResponse>> {
    let Json(req) = payload?;

    let (access_token, claims) = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    if state.store.find_user_by_id(claims.sub).await?.is_none() {
        return Err(ApiError::Unauthorized("User not found".to_string()));
    }

    Ok(Json(RefreshResponse {
        access_token,
        token_type: "Bearer",
        expires_in: claims.expires_in(),
    }))
}

/// Clear the session cookie; bearer tokens simply expire
pub async fn logout(jar: CookieJar) -> (StatusCode, CookieJar) {
    (StatusCode::NO_CONTENT, jar.add(clear_session_cookie()))
}

pub async fn me(user: CurrentUser) -> Json<CurrentUser> {
    Json(user)
}

fn email_taken() -> ApiError {
    ApiError::Conflict("An account with this email already exists".to_string())
}

fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: User,
) -> ApiResult<(CookieJar, Json<SessionResponse>)> {
    let tokens = jwt::issue_token_pair(user.id, &user.email, state.jwt_secret())?;
    let jar = jar.add(session_cookie(
        tokens.access_token.clone(),
        state.config.api.production,
    ));

    Ok((
        jar,
        Json(SessionResponse {
            user: CurrentUser::from(user),
            tokens,
        }),
    ))
}
