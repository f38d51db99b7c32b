use anyhow::anyhow;
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use rand::Rng;
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{db::Database, error::AppError, models::Session, AppState};

/// Name of the cookie carrying the session token
pub const SESSION_COOKIE: &str = "session_token";

/// Session of the requester, if any
#[derive(Debug, Clone, Default)]
pub struct Viewer(pub Option<Session>);

impl Viewer {
    pub fn user_id(&self) -> Option<Uuid> {
        self.0.as_ref().map(|s| s.user_id)
    }

    pub fn is_logged_in(&self) -> bool {
        self.0.is_some()
    }
}

/// Logged-in user extracted from the session cookie
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Session);

impl std::ops::Deref for AuthenticatedUser {
    type Target = Session;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// Resolve the session cookie of a request against the sessions table
async fn session_from_parts(parts: &Parts, db: &Database) -> Result<Option<Session>, AppError> {
    let jar = CookieJar::from_headers(&parts.headers);
    let Some(cookie) = jar.get(SESSION_COOKIE) else {
        return Ok(None);
    };

    db.validate_session(&hash_session_token(cookie.value())).await
}

impl<S> FromRequestParts<S> for Viewer
where
    Database: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let db = Database::from_ref(state);
        Ok(Viewer(session_from_parts(parts, &db).await?))
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Database: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let db = Database::from_ref(state);
        session_from_parts(parts, &db)
            .await?
            .map(AuthenticatedUser)
            .ok_or_else(|| AppError::Unauthorized("Login required".to_string()))
    }
}

// Implement FromRef so we can extract Database from AppState
impl FromRef<AppState> for Database {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

/// Hash a session token for storage/lookup
pub fn hash_session_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Generate a new random session token
pub fn generate_session_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    hex::encode(bytes)
}

/// Session cookie for a freshly issued token
pub fn session_cookie(token: String, lifetime_minutes: i64, secure: bool) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, token))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::minutes(lifetime_minutes))
        .build()
}

/// Cookie that removes the session cookie
pub fn removal_cookie() -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, "")).path("/").build()
}

/// Argon2 PHC string for a password
pub fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt_bytes: [u8; 16] = rand::thread_rng().gen();
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| anyhow!("Failed to encode salt: {}", e))?;

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Check a password against a stored PHC string
pub fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}
