//! Application state shared across handlers.

use std::sync::Arc;

use sqlx::PgPool;
use thiserror::Error;

use crate::config::ApiConfig;
use crate::graphql::{ApiSchema, GraphqlSettings, build_schema};
use crate::services::{
    AfricasTalkingClient, Auth0Client, IdentityError, IdentityProvider, LogNotifier,
    NotificationError, OrderNotifier, PasswordGrant,
};

/// Errors raised while building the external clients.
#[derive(Debug, Error)]
pub enum StateError {
    /// Identity provider client could not be built.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// SMS gateway client could not be built.
    #[error(transparent)]
    Notification(#[from] NotificationError),
}

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. External collaborators are held as trait
/// objects so tests can substitute stubs.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: ApiConfig,
    pool: PgPool,
    identity: Arc<dyn IdentityProvider>,
    tokens: Arc<dyn PasswordGrant>,
    notifier: Arc<dyn OrderNotifier>,
    schema: ApiSchema,
}

impl AppState {
    /// Create state with the Auth0 client and, when configured, the SMS
    /// gateway.
    ///
    /// # Errors
    ///
    /// Returns `StateError` if the identity provider or SMS client cannot be
    /// built.
    pub fn new(config: ApiConfig, pool: PgPool) -> Result<Self, StateError> {
        let auth0 = Arc::new(Auth0Client::new(&config.auth0)?);
        let notifier: Arc<dyn OrderNotifier> = match &config.sms {
            Some(sms) => Arc::new(AfricasTalkingClient::new(sms)?),
            None => {
                tracing::warn!("AT_USERNAME/AT_API_KEY not set, order confirmations will only be logged");
                Arc::new(LogNotifier)
            }
        };

        Ok(Self::from_parts(
            config,
            pool,
            auth0.clone(),
            auth0,
            notifier,
        ))
    }

    /// Create state from explicit collaborators.
    #[must_use]
    pub fn from_parts(
        config: ApiConfig,
        pool: PgPool,
        identity: Arc<dyn IdentityProvider>,
        tokens: Arc<dyn PasswordGrant>,
        notifier: Arc<dyn OrderNotifier>,
    ) -> Self {
        let schema = build_schema(
            pool.clone(),
            Arc::clone(&notifier),
            GraphqlSettings {
                require_auth: config.graphql_require_auth,
            },
        );

        Self {
            inner: Arc::new(AppStateInner {
                config,
                pool,
                identity,
                tokens,
                notifier,
                schema,
            }),
        }
    }

    /// Get a reference to the API configuration.
    #[must_use]
    pub fn config(&self) -> &ApiConfig {
        &self.inner.config
    }

    /// Get a reference to the database connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Token verification and user provisioning.
    #[must_use]
    pub fn identity(&self) -> &dyn IdentityProvider {
        self.inner.identity.as_ref()
    }

    /// Password and refresh-token grants.
    #[must_use]
    pub fn tokens(&self) -> &dyn PasswordGrant {
        self.inner.tokens.as_ref()
    }

    /// Order confirmation sender.
    #[must_use]
    pub fn notifier(&self) -> &dyn OrderNotifier {
        self.inner.notifier.as_ref()
    }

    /// The GraphQL schema.
    #[must_use]
    pub fn schema(&self) -> &ApiSchema {
        &self.inner.schema
    }
}
