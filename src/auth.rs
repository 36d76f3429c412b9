use std::sync::Arc;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::AppState;
use crate::error::{AppError, AppResult};

/// Password hashing seam. Handlers never touch the hash format directly.
pub trait CredentialHasher: Send + Sync {
    fn hash(&self, password: &str) -> AppResult<String>;
    fn verify(&self, password: &str, hash: &str) -> AppResult<bool>;
}

pub struct Argon2Hasher;

impl CredentialHasher for Argon2Hasher {
    fn hash(&self, password: &str) -> AppResult<String> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|h| h.to_string())
            .map_err(|e| AppError::Internal(format!("password hash error: {e}")))
    }

    fn verify(&self, password: &str, hash: &str) -> AppResult<bool> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| AppError::Internal(format!("stored hash is malformed: {e}")))?;
        Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Username of the authenticated account.
    pub sub: String,
    /// Expiration, seconds since the epoch.
    pub exp: usize,
}

/// Token issue/validate seam over the identity encoded in a bearer token.
pub trait TokenIssuer: Send + Sync {
    fn issue(&self, username: &str) -> AppResult<String>;
    fn validate(&self, token: &str) -> AppResult<String>;
}

pub struct JwtIssuer {
    secret: String,
    ttl_seconds: i64,
}

impl JwtIssuer {
    pub fn new(secret: String, ttl_hours: i64) -> Self {
        Self { secret, ttl_seconds: ttl_hours * 3_600 }
    }
}

impl TokenIssuer for JwtIssuer {
    fn issue(&self, username: &str) -> AppResult<String> {
        let exp = jiff::Timestamp::now().as_second() + self.ttl_seconds;
        let claims = Claims { sub: username.to_string(), exp: exp as usize };

        encode(&Header::default(), &claims, &EncodingKey::from_secret(self.secret.as_bytes()))
            .map_err(|e| AppError::Internal(format!("token sign error: {e}")))
    }

    fn validate(&self, token: &str) -> AppResult<String> {
        let data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &Validation::default(),
        )
        .map_err(|_| AppError::TokenInvalid)?;

        Ok(data.claims.sub)
    }
}

/// Authenticated identity extracted from the `Authorization: Bearer <token>`
/// header. Add as a handler parameter to require authentication.
#[derive(Debug)]
pub struct AuthUser {
    pub username: String,
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("Authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or(AppError::TokenMissing)?;

        let token = auth_header.strip_prefix("Bearer ").ok_or(AppError::TokenInvalid)?;
        let username = state.tokens.validate(token)?;

        Ok(AuthUser { username })
    }
}
