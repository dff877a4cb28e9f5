//! Auth0 client.
//!
//! Verifies access tokens against the tenant's JWKS, creates users through the
//! Management API, and runs the password and refresh-token grants.

use std::sync::Arc;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info, instrument, warn};

use super::identity::{
    IdentityError, IdentityProvider, NewIdentityUser, PasswordGrant, TokenSet, VerifiedIdentity,
};
use super::jwks::TokenVerifier;
use crate::config::Auth0Config;

/// Scope requested by the password grant.
const LOGIN_SCOPE: &str = "openid profile email offline_access";

/// Auth0 tenant client.
///
/// Cheap to clone. The JWKS is cached in memory and reloaded when a token
/// names a key id the cache does not contain.
#[derive(Clone)]
pub struct Auth0Client {
    inner: Arc<Auth0ClientInner>,
}

struct Auth0ClientInner {
    client: reqwest::Client,
    config: Auth0Config,
    verifier: TokenVerifier,
    jwks: RwLock<Option<JwkSet>>,
}

impl std::fmt::Debug for Auth0Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth0Client")
            .field("config", &self.inner.config)
            .finish_non_exhaustive()
    }
}

/// OAuth token endpoint success body.
#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    id_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default = "default_token_type")]
    token_type: String,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    scope: Option<String>,
}

fn default_token_type() -> String {
    "Bearer".to_owned()
}

impl From<TokenResponse> for TokenSet {
    fn from(response: TokenResponse) -> Self {
        Self {
            access_token: response.access_token,
            id_token: response.id_token,
            refresh_token: response.refresh_token,
            token_type: response.token_type,
            expires_in: response.expires_in,
            scope: response.scope,
        }
    }
}

/// Error body shared by the OAuth and Management endpoints. OAuth uses
/// `error_description`, Management uses `message`.
#[derive(Debug, Default, Deserialize)]
struct Auth0ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    error_description: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl Auth0ErrorBody {
    fn into_message(self, status: StatusCode) -> String {
        self.error_description
            .or(self.message)
            .or(self.error)
            .unwrap_or_else(|| format!("HTTP {status}"))
    }
}

#[derive(Serialize)]
struct CreateUserRequest<'a> {
    email: &'a str,
    password: &'a str,
    connection: &'a str,
    given_name: &'a str,
    family_name: &'a str,
}

#[derive(Deserialize)]
struct CreatedUser {
    user_id: String,
}

impl Auth0Client {
    /// Create a client for the configured tenant.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Http` if the HTTP client cannot be built.
    pub fn new(config: &Auth0Config) -> Result<Self, IdentityError> {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(15))
            .build()?;

        Ok(Self {
            inner: Arc::new(Auth0ClientInner {
                client,
                verifier: TokenVerifier::new(config.issuer(), config.audience.clone()),
                config: config.clone(),
                jwks: RwLock::new(None),
            }),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.inner.config.base_url())
    }

    async fn has_key(&self, kid: &str) -> bool {
        self.inner
            .jwks
            .read()
            .await
            .as_ref()
            .is_some_and(|keys| keys.find(kid).is_some())
    }

    /// Fetch the tenant's signing keys and replace the cache.
    #[instrument(skip(self))]
    async fn reload_jwks(&self) -> Result<(), IdentityError> {
        let response = self
            .inner
            .client
            .get(self.url("/.well-known/jwks.json"))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(IdentityError::Jwks(format!("JWKS endpoint returned {status}")));
        }

        let keys: JwkSet = response
            .json()
            .await
            .map_err(|e| IdentityError::Jwks(e.to_string()))?;
        debug!(keys = keys.keys.len(), "JWKS loaded");
        *self.inner.jwks.write().await = Some(keys);
        Ok(())
    }

    /// Obtain a Management API token with the client-credentials grant.
    #[instrument(skip(self))]
    async fn management_token(&self) -> Result<SecretString, IdentityError> {
        let config = &self.inner.config;
        let response = self
            .inner
            .client
            .post(self.url("/oauth/token"))
            .form(&[
                ("grant_type", "client_credentials"),
                ("client_id", config.client_id.as_str()),
                ("client_secret", config.client_secret.expose_secret()),
                ("audience", config.management_audience.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let token: TokenResponse = response.json().await?;
            Ok(SecretString::from(token.access_token))
        } else {
            let body: Auth0ErrorBody = response.json().await.unwrap_or_default();
            Err(IdentityError::Api {
                status: status.as_u16(),
                message: body.into_message(status),
            })
        }
    }

    /// POST a grant to the token endpoint with the login client.
    async fn token_grant(&self, params: &[(&str, &str)]) -> Result<TokenSet, IdentityError> {
        let config = &self.inner.config;
        let mut form = vec![
            ("client_id", config.login_client_id.as_str()),
            ("client_secret", config.login_client_secret.expose_secret()),
        ];
        form.extend_from_slice(params);

        let response = self
            .inner
            .client
            .post(self.url("/oauth/token"))
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            let token: TokenResponse = response.json().await?;
            return Ok(token.into());
        }

        let body: Auth0ErrorBody = response.json().await.unwrap_or_default();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            Err(IdentityError::InvalidCredentials(body.into_message(status)))
        } else {
            Err(IdentityError::Api {
                status: status.as_u16(),
                message: body.into_message(status),
            })
        }
    }
}

#[async_trait]
impl IdentityProvider for Auth0Client {
    #[instrument(skip(self, token))]
    async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let kid = TokenVerifier::key_id(token)?;

        if !self.has_key(&kid).await {
            debug!(kid = %kid, "Signing key not cached, reloading JWKS");
            self.reload_jwks().await?;
        }

        let keys = self.inner.jwks.read().await;
        let keys = keys
            .as_ref()
            .ok_or_else(|| IdentityError::Jwks("no signing keys loaded".to_owned()))?;
        self.inner.verifier.verify(token, &kid, keys)
    }

    #[instrument(skip(self, user), fields(email = %user.email))]
    async fn create_user(&self, user: &NewIdentityUser<'_>) -> Result<String, IdentityError> {
        let token = self.management_token().await?;

        let response = self
            .inner
            .client
            .post(self.url("/api/v2/users"))
            .bearer_auth(token.expose_secret())
            .json(&CreateUserRequest {
                email: user.email,
                password: user.password.expose_secret(),
                connection: &self.inner.config.connection,
                given_name: user.given_name,
                family_name: user.family_name,
            })
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::CREATED || status == StatusCode::OK {
            let created: CreatedUser = response.json().await?;
            info!(subject = %created.user_id, "Identity user created");
            return Ok(created.user_id);
        }

        let body: Auth0ErrorBody = response.json().await.unwrap_or_default();
        if status == StatusCode::CONFLICT {
            return Err(IdentityError::UserExists(user.email.to_owned()));
        }

        let message = body.into_message(status);
        warn!(status = %status, message = %message, "User creation rejected");
        Err(IdentityError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl PasswordGrant for Auth0Client {
    #[instrument(skip(self, password))]
    async fn login(&self, email: &str, password: &SecretString) -> Result<TokenSet, IdentityError> {
        let audience = self.inner.config.audience.clone();
        self.token_grant(&[
            ("grant_type", "password"),
            ("username", email),
            ("password", password.expose_secret()),
            ("audience", audience.as_str()),
            ("scope", LOGIN_SCOPE),
        ])
        .await
    }

    #[instrument(skip(self, refresh_token))]
    async fn refresh(&self, refresh_token: &SecretString) -> Result<TokenSet, IdentityError> {
        self.token_grant(&[
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.expose_secret()),
        ])
        .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_token_response_defaults() {
        let response: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":86400}"#).unwrap();
        let tokens = TokenSet::from(response);
        assert_eq!(tokens.access_token, "abc");
        assert_eq!(tokens.token_type, "Bearer");
        assert_eq!(tokens.expires_in, 86_400);
        assert!(tokens.refresh_token.is_none());
    }

    #[test]
    fn test_error_body_prefers_description() {
        let body: Auth0ErrorBody = serde_json::from_str(
            r#"{"error":"invalid_grant","error_description":"Wrong email or password."}"#,
        )
        .unwrap();
        assert_eq!(
            body.into_message(StatusCode::FORBIDDEN),
            "Wrong email or password."
        );
    }

    #[test]
    fn test_error_body_management_message() {
        let body: Auth0ErrorBody = serde_json::from_str(
            r#"{"statusCode":400,"error":"Bad Request","message":"PasswordStrengthError: Password is too weak"}"#,
        )
        .unwrap();
        assert_eq!(
            body.into_message(StatusCode::BAD_REQUEST),
            "PasswordStrengthError: Password is too weak"
        );
    }

    #[test]
    fn test_error_body_empty_falls_back_to_status() {
        let body = Auth0ErrorBody::default();
        assert!(body.into_message(StatusCode::BAD_GATEWAY).contains("502"));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = Auth0Config {
            domain: "tenant.auth0.com".into(),
            audience: "https://api".into(),
            client_id: "mgmt".into(),
            client_secret: SecretString::from("mgmt-secret-value"),
            management_audience: "https://tenant.auth0.com/api/v2/".into(),
            login_client_id: "login".into(),
            login_client_secret: SecretString::from("login-secret-value"),
            connection: "Username-Password-Authentication".into(),
        };
        let client = Auth0Client::new(&config).unwrap();
        let debug = format!("{client:?}");
        assert!(debug.contains("tenant.auth0.com"));
        assert!(!debug.contains("mgmt-secret-value"));
        assert!(!debug.contains("login-secret-value"));
    }
}
