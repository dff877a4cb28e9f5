//! GraphQL error mapping.
//!
//! Resolver failures become error entries whose `extensions.code` names the
//! failure class. Resolvers convert with [`ResultExt::gql`] rather than `?` on
//! the raw error, so every entry carries a code.

use async_graphql::ErrorExtensions;
use thiserror::Error;
use tracing::{error, warn};

use simple_ecomm_core::{
    EmailError, IdParseError, OrderLineError, PhoneError, PriceError, StatusError,
};

use crate::db::RepositoryError;
use crate::services::OrderError;

/// Error returned to GraphQL clients.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    InvalidReference(String),

    #[error("{0}")]
    Conflict(String),

    #[error("service temporarily unavailable, please retry")]
    Transient,

    #[error("authentication required")]
    Unauthenticated,

    /// Detail is logged, never sent.
    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    /// Value of `extensions.code`.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION",
            Self::InvalidReference(_) => "INVALID_REFERENCE",
            Self::Conflict(_) => "CONFLICT",
            Self::Transient => "TRANSIENT",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Internal(_) => "INTERNAL",
        }
    }
}

impl ErrorExtensions for ApiError {
    fn extend(&self) -> async_graphql::Error {
        if let Self::Internal(detail) = self {
            let event_id = sentry::capture_message(detail, sentry::Level::Error);
            error!(error = %detail, sentry_event_id = %event_id, "GraphQL resolver error");
        }

        let code = self.code();
        async_graphql::Error::new(self.to_string())
            .extend_with(|_, ext| ext.set("code", code.to_owned()))
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(_) => Self::NotFound(err.to_string()),
            RepositoryError::Validation(msg) => Self::Validation(msg),
            RepositoryError::InvalidReference(msg) => Self::InvalidReference(msg),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::Transient { .. } => {
                warn!(error = %err, "Transient database failure");
                Self::Transient
            }
            RepositoryError::Database { .. } | RepositoryError::DataCorruption(_) => {
                Self::Internal(err.to_string())
            }
        }
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::InvalidLines(e) => e.into(),
            OrderError::InvalidStatus(e) => e.into(),
            OrderError::Repository(e) => e.into(),
        }
    }
}

macro_rules! validation_from {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for ApiError {
                fn from(err: $ty) -> Self {
                    Self::Validation(err.to_string())
                }
            }
        )+
    };
}

validation_from!(
    IdParseError,
    PriceError,
    EmailError,
    PhoneError,
    StatusError,
    OrderLineError,
);

/// Convert any error with an [`ApiError`] mapping into a coded GraphQL error.
pub trait ResultExt<T> {
    /// Map the error through [`ApiError`] and attach its code.
    ///
    /// # Errors
    ///
    /// Returns the mapped error when `self` is `Err`.
    fn gql(self) -> async_graphql::Result<T>;
}

impl<T, E: Into<ApiError>> ResultExt<T> for Result<T, E> {
    fn gql(self) -> async_graphql::Result<T> {
        self.map_err(|e| {
            let err: ApiError = e.into();
            err.extend()
        })
    }
}
