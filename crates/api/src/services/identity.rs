//! Identity provider capabilities.
//!
//! The rest of the crate only sees these traits. [`super::auth0::Auth0Client`]
//! implements both against an Auth0 tenant; tests substitute stubs.

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by identity provider calls.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Provider returned an unexpected status.
    #[error("identity provider error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Error description from the provider.
        message: String,
    },

    /// Email/password or refresh token rejected.
    #[error("invalid credentials: {0}")]
    InvalidCredentials(String),

    /// A user with this email already exists at the provider.
    #[error("user already exists: {0}")]
    UserExists(String),

    /// Bearer token failed verification.
    #[error("invalid token: {0}")]
    InvalidToken(String),

    /// Signing keys could not be loaded.
    #[error("signing keys unavailable: {0}")]
    Jwks(String),
}

impl IdentityError {
    /// Whether the caller supplied bad credentials (as opposed to the
    /// provider being unreachable or misbehaving).
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidCredentials(_) | Self::InvalidToken(_) | Self::UserExists(_)
        ) || matches!(self, Self::Api { status, .. } if *status >= 400 && *status < 500)
    }
}

/// Claims extracted from a verified access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Subject identifier (stored as `customers.auth_id`).
    pub subject: String,
    /// Email claim, when the token carries one.
    pub email: Option<String>,
}

/// User to be created at the identity provider.
pub struct NewIdentityUser<'a> {
    pub email: &'a str,
    pub password: &'a SecretString,
    pub given_name: &'a str,
    pub family_name: &'a str,
}

/// Tokens returned by a password or refresh grant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenSet {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

/// Verifies bearer tokens and provisions users.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Verify an access token and return its identity.
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError>;

    /// Create a user and return its subject identifier.
    async fn create_user(&self, user: &NewIdentityUser<'_>) -> Result<String, IdentityError>;
}

/// Exchanges credentials for tokens.
#[async_trait]
pub trait PasswordGrant: Send + Sync {
    /// Resource-owner password grant.
    async fn login(&self, email: &str, password: &SecretString) -> Result<TokenSet, IdentityError>;

    /// Refresh-token grant.
    async fn refresh(&self, refresh_token: &SecretString) -> Result<TokenSet, IdentityError>;
}
