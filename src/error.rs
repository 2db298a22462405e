use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::security::DenyReason;
use crate::users::repo::RepoError;

pub type AppResult<T> = Result<T, AppError>;

/// A single field-level validation failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("validation failed")]
    Validation(Vec<FieldError>),
    #[error("user with this email already exists")]
    DuplicateEmail,
    #[error("user not found")]
    NotFound,
    #[error("authentication token is required")]
    MissingToken,
    #[error("authentication token is invalid or expired")]
    InvalidToken,
    #[error("authentication required: {0}")]
    Unauthenticated(&'static str),
    #[error("access denied: {0}")]
    Forbidden(&'static str),
    #[error("invalid credentials")]
    CredentialMismatch,
    #[error("request blocked: {0:?}")]
    Blocked(DenyReason),
    #[error("security layer failure: {0}")]
    SecurityFailure(anyhow::Error),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateEmail => StatusCode::CONFLICT,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::MissingToken | Self::Unauthenticated(_) | Self::CredentialMismatch => {
                StatusCode::UNAUTHORIZED
            }
            Self::InvalidToken | Self::Forbidden(_) | Self::Blocked(_) => StatusCode::FORBIDDEN,
            Self::SecurityFailure(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn body(&self) -> serde_json::Value {
        match self {
            Self::Validation(details) => json!({
                "error": "Validation failed",
                "details": details,
            }),
            Self::DuplicateEmail => json!({ "error": "Email already exists" }),
            Self::NotFound => json!({
                "error": "User not found",
                "message": "The requested user does not exist",
            }),
            Self::MissingToken => json!({
                "error": "Access denied",
                "message": "Authentication token is required",
            }),
            Self::InvalidToken => json!({
                "error": "Invalid token",
                "message": "Authentication token is invalid or expired",
            }),
            Self::Unauthenticated(message) => json!({
                "error": "Authentication required",
                "message": message,
            }),
            Self::Forbidden(message) => json!({
                "error": "Access denied",
                "message": message,
            }),
            Self::CredentialMismatch => json!({
                "error": "Invalid credentials",
                "message": "The email or password is incorrect",
            }),
            Self::Blocked(reason) => json!({
                "error": "Forbidden",
                "message": reason.message(),
            }),
            Self::SecurityFailure(_) => json!({
                "error": "Internal Server Error",
                "message": "Something went wrong with security middleware",
            }),
            Self::Internal(_) => json!({
                "error": "Internal Server Error",
                "message": "Something went wrong",
            }),
        }
    }
}

impl From<RepoError> for AppError {
    fn from(e: RepoError) -> Self {
        match e {
            RepoError::DuplicateEmail => Self::DuplicateEmail,
            RepoError::NotFound => Self::NotFound,
            RepoError::Database(e) => Self::Internal(anyhow::Error::new(e).context("database")),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            Self::SecurityFailure(e) => error!(error = %e, "security middleware error"),
            Self::Internal(e) => error!(error = ?e, "unhandled error"),
            _ => {}
        }
        (self.status(), Json(self.body())).into_response()
    }
}
