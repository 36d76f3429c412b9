use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::DbErr;
use serde::Serialize;
use thiserror::Error;

/// Structured error body returned by every endpoint on failure.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("Authentication required")]
    TokenMissing,
    #[error("Invalid or expired token")]
    TokenInvalid,
    // Identical message for unknown username and wrong password, so the
    // response does not leak which usernames exist.
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Username is already taken")]
    UsernameTaken,
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => {
                (StatusCode::BAD_REQUEST, ErrorBody { code: "VALIDATION_ERROR", message: msg })
            }
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                ErrorBody { code: "TOKEN_MISSING", message: "Authentication required".into() },
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                ErrorBody { code: "TOKEN_INVALID", message: "Invalid or expired token".into() },
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorBody { code: "INVALID_CREDENTIALS", message: "Invalid credentials".into() },
            ),
            AppError::UsernameTaken => (
                StatusCode::CONFLICT,
                ErrorBody { code: "USERNAME_TAKEN", message: "Username is already taken".into() },
            ),
            AppError::NotFound(msg) => {
                (StatusCode::NOT_FOUND, ErrorBody { code: "NOT_FOUND", message: msg })
            }
            AppError::Internal(detail) => {
                tracing::error!("internal error: {detail}");
                // The raw error message is surfaced to the client.
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody { code: "INTERNAL_ERROR", message: detail },
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

pub type AppResult<T> = Result<T, AppError>;
