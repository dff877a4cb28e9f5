//! Unified error handling for the REST routes, with Sentry integration.
//!
//! Handlers return `Result<T, AppError>`. Server errors are captured to Sentry
//! before the response is written; clients only ever see a short message in a
//! `{"error": "..."}` body.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::{IdentityError, RegistrationError};

/// Application-level error type for HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Repository(#[from] RepositoryError),

    /// Identity provider call failed.
    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    /// Registration failed.
    #[error("Registration error: {0}")]
    Registration(#[from] RegistrationError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const INTERNAL_MESSAGE: &str = "Internal server error";

fn repository_response(err: &RepositoryError) -> (StatusCode, String) {
    match err {
        RepositoryError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        RepositoryError::Conflict(_) => (StatusCode::CONFLICT, err.to_string()),
        RepositoryError::InvalidReference(_) | RepositoryError::Validation(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        RepositoryError::Transient { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Service temporarily unavailable".to_string(),
        ),
        RepositoryError::Database { .. } | RepositoryError::DataCorruption(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string())
        }
    }
}

fn identity_response(err: &IdentityError) -> (StatusCode, String) {
    match err {
        IdentityError::InvalidCredentials(_) => {
            (StatusCode::UNAUTHORIZED, "Invalid credentials".to_string())
        }
        IdentityError::InvalidToken(_) => (StatusCode::UNAUTHORIZED, "Invalid token".to_string()),
        IdentityError::UserExists(_) => (
            StatusCode::CONFLICT,
            "An account with this email already exists".to_string(),
        ),
        IdentityError::Api { status, message } if (400..500).contains(status) => {
            (StatusCode::BAD_REQUEST, message.clone())
        }
        IdentityError::Api { .. } | IdentityError::Http(_) | IdentityError::Jwks(_) => (
            StatusCode::BAD_GATEWAY,
            "Identity provider error".to_string(),
        ),
    }
}

impl AppError {
    /// Status code and client-facing message.
    fn parts(&self) -> (StatusCode, String) {
        match self {
            Self::Repository(err) => repository_response(err),
            Self::Identity(err) => identity_response(err),
            Self::Registration(err) => match err {
                RegistrationError::InvalidEmail(_)
                | RegistrationError::InvalidPhone(_)
                | RegistrationError::MissingField(_) => (StatusCode::BAD_REQUEST, err.to_string()),
                RegistrationError::EmailTaken(_) => (
                    StatusCode::CONFLICT,
                    "An account with this email already exists".to_string(),
                ),
                RegistrationError::Identity(inner) => identity_response(inner),
                RegistrationError::Repository(inner) => repository_response(inner),
            },
            Self::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found")),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_MESSAGE.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.parts();

        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Associate subsequent Sentry events with an authenticated subject.
pub fn set_sentry_user(subject: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(subject.to_owned()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}
