/// Admin authentication.
/// Exchanges the admin password for a signed session token and verifies bearer
/// tokens on protected routes. Sessions are stateless: a token is valid iff its
/// signature checks out and it has not expired.
use crate::config::ServerConfig;
use crate::db::{models::AdminCredential, Database, DbPool, StoreError};
use crate::error::ApiError;
use actix_web::{dev::Payload, http::header, web, FromRequest, HttpRequest};
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::future::{ready, Ready};
use thiserror::Error;

/// Minimum admin password length, in characters
pub const MIN_PASSWORD_LEN: usize = 8;

/// bcrypt cost factor
pub const HASH_COST: u32 = 10;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Password must be at least 8 characters")]
    PasswordTooShort,

    #[error("Admin not initialized")]
    NotInitialized,

    #[error("Invalid password")]
    InvalidPassword,

    #[error("Authorization token missing")]
    MissingToken,

    #[error("Invalid or expired token")]
    InvalidToken(String),

    #[error("Token lifetime out of range: {0}s")]
    TokenLifetime(i64),

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    Hash(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Session token claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub admin: bool,
    pub iat: i64,
    pub exp: i64,
}

pub fn check_password_length(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AuthError::PasswordTooShort);
    }
    Ok(())
}

/// Issue an admin token valid for `ttl_seconds` from now
pub fn issue_token(secret: &str, ttl_seconds: i64) -> Result<String, AuthError> {
    issue_token_at(secret, Utc::now().timestamp(), ttl_seconds)
}

/// Issue an admin token as if it had been issued at `issued_at` (Unix seconds)
pub fn issue_token_at(secret: &str, issued_at: i64, ttl_seconds: i64) -> Result<String, AuthError> {
    if ttl_seconds <= 0 {
        return Err(AuthError::TokenLifetime(ttl_seconds));
    }
    let exp = issued_at
        .checked_add(ttl_seconds)
        .ok_or(AuthError::TokenLifetime(ttl_seconds))?;

    let claims = Claims {
        admin: true,
        iat: issued_at,
        exp,
    };
    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )?)
}

/// Check signature and expiry of a token
pub fn verify_token(secret: &str, token: &str) -> Result<Claims, AuthError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| AuthError::InvalidToken(e.to_string()))?;

    if !data.claims.admin {
        return Err(AuthError::InvalidToken("not an admin token".to_string()));
    }
    Ok(data.claims)
}

/// Salted bcrypt hash, computed off the async executor
pub async fn hash_password(password: &str) -> Result<String, AuthError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, HASH_COST))
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .map_err(|e| AuthError::Hash(e.to_string()))
}

pub async fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AuthError::Hash(e.to_string()))?
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// Exchange the admin password for a session token.
///
/// The length check runs before anything touches the store.
pub async fn authenticate(
    pool: &DbPool,
    config: &ServerConfig,
    password: &str,
) -> Result<String, AuthError> {
    check_password_length(password)?;

    let hash = match Database::get_admin(pool).await? {
        Some(AdminCredential {
            initialized: true,
            password_hash: Some(hash),
            ..
        }) => hash,
        _ => return Err(AuthError::NotInitialized),
    };

    if !verify_password(password, &hash).await? {
        log::warn!("Rejected admin login: wrong password");
        return Err(AuthError::InvalidPassword);
    }

    let token = issue_token(&config.jwt_secret, config.token_ttl_seconds)?;
    log::info!("Admin authenticated");
    Ok(token)
}

fn bearer_token(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().split_once(' '))
        .filter(|(scheme, _)| scheme.eq_ignore_ascii_case("bearer"))
        .map(|(_, token)| token.trim())
        .filter(|t| !t.is_empty())
}

/// Extractor guarding admin-only handlers.
/// Missing token -> 401, bad or expired token -> 403.
#[derive(Debug, Clone)]
pub struct AdminSession {
    pub claims: Claims,
}

impl AdminSession {
    fn from_http_request(req: &HttpRequest) -> Result<Self, ApiError> {
        let config = req
            .app_data::<web::Data<ServerConfig>>()
            .ok_or_else(|| ApiError::Internal("ServerConfig not registered".to_string()))?;

        let token = bearer_token(req).ok_or(AuthError::MissingToken)?;
        let claims = verify_token(&config.jwt_secret, token).map_err(|e| {
            if let AuthError::InvalidToken(reason) = &e {
                log::debug!("Token rejected: {}", reason);
            }
            e
        })?;

        Ok(AdminSession { claims })
    }
}

impl FromRequest for AdminSession {
    type Error = ApiError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_http_request(req))
    }
}
