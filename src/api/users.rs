use axum::{extract::State, Json};
use axum_extra::extract::CookieJar;
use chrono::{Duration, Utc};

use crate::{
    auth::{
        generate_session_token, hash_password, hash_session_token, removal_cookie, session_cookie,
        verify_password, AuthenticatedUser, Viewer, SESSION_COOKIE,
    },
    error::{AppError, Result},
    models::{
        is_valid_email, is_valid_password, is_valid_username, LoginRequest, RegisterRequest,
        SessionResponse, User,
    },
    AppState,
};

/// Create an account and log it in
pub async fn register(
    State(state): State<AppState>,
    viewer: Viewer,
    jar: CookieJar,
    Json(req): Json<RegisterRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    if viewer.is_logged_in() {
        return Err(AppError::BadRequest("Already logged in".to_string()));
    }

    let username = req.username.trim();
    let email = req.email.trim().to_lowercase();

    if !is_valid_username(username) {
        return Err(AppError::BadRequest(
            "Username must be 5-25 characters of letters, digits, '-' or '_'".to_string(),
        ));
    }
    if !is_valid_email(&email) {
        return Err(AppError::BadRequest("Invalid email address".to_string()));
    }
    if !is_valid_password(&req.password) {
        return Err(AppError::BadRequest(
            "Password must be 5-25 characters of letters, digits or -_!@#$%^&*()".to_string(),
        ));
    }
    if state.db.name_or_email_exists(username).await? {
        return Err(AppError::Conflict("Name already taken".to_string()));
    }
    if state.db.name_or_email_exists(&email).await? {
        return Err(AppError::Conflict("Email already taken".to_string()));
    }

    let password_hash = hash_password(&req.password)?;
    let user = state.db.create_user(&email, username, &password_hash).await?;
    tracing::info!("Registered user {}", user.username);

    start_session(&state, jar, &user).await
}

/// Log in with username or email
pub async fn login(
    State(state): State<AppState>,
    viewer: Viewer,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    if viewer.is_logged_in() {
        return Err(AppError::BadRequest("Already logged in".to_string()));
    }

    let invalid = || AppError::Unauthorized("Invalid username/email or password".to_string());

    let user = state
        .db
        .find_user_by_login(req.username_or_email.trim())
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&req.password, &user.password) {
        return Err(invalid());
    }

    start_session(&state, jar, &user).await
}

/// End the current session
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> Result<CookieJar> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        state.db.delete_session(&hash_session_token(cookie.value())).await?;
    }
    Ok(jar.remove(removal_cookie()))
}

/// The logged-in user
pub async fn me(user: AuthenticatedUser) -> Json<SessionResponse> {
    Json(user.0.into())
}

/// Issue a token, store its hash and hand the token out as a cookie
async fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: &User,
) -> Result<(CookieJar, Json<SessionResponse>)> {
    let lifetime = state.config.sessions.lifetime_minutes;
    let token = generate_session_token();
    let expires_at = Utc::now() + Duration::minutes(lifetime);

    let session = state
        .db
        .create_session(user.id, &user.username, &hash_session_token(&token), expires_at)
        .await?;

    let jar = jar.add(session_cookie(token, lifetime, state.config.sessions.secure_cookie));
    Ok((jar, Json(session.into())))
}
