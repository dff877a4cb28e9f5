//! Database operations for the simple-ecomm `PostgreSQL` store.
//!
//! ## Tables
//!
//! - `categories` - Self-referencing category tree (`parent_id`)
//! - `products` - Products, optionally filed under a category
//! - `customers` - Customers keyed by the identity provider's subject id
//! - `orders` - Order headers
//! - `order_items` - Line items with the unit price paid
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p simple-ecomm-cli -- migrate
//! ```
//!
//! The server never migrates on startup.

pub mod catalog;
pub mod categories;
pub mod customers;
pub mod orders;
pub mod products;

use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

pub use catalog::CatalogRepository;
pub use categories::CategoryRepository;
pub use customers::CustomerRepository;
pub use orders::OrderRepository;
pub use products::ProductRepository;

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
///
/// Driver errors are classified once, in [`RepositoryError::from_sqlx`], so
/// callers can branch on the kind of failure rather than on SQLSTATE codes.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Unclassified database error.
    #[error("{operation}: database error: {source}")]
    Database {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// The database could not be reached or the connection broke. Retryable.
    #[error("{operation}: database unavailable: {source}")]
    Transient {
        operation: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("{0} not found")]
    NotFound(String),

    /// Unique constraint violation (e.g., duplicate email).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Foreign key violation (e.g., unknown customer or product).
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// Check constraint or business-rule violation.
    #[error("validation failed: {0}")]
    Validation(String),
}

impl RepositoryError {
    /// Classify a driver error raised while performing `operation`.
    #[must_use]
    pub fn from_sqlx(operation: &'static str, err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(db_err) = &err {
            let constraint = db_err.constraint().unwrap_or("constraint");
            if db_err.is_unique_violation() {
                return Self::Conflict(format!(
                    "{operation}: duplicate value violates {constraint}"
                ));
            }
            if db_err.is_foreign_key_violation() {
                return Self::InvalidReference(format!(
                    "{operation}: referenced row does not exist ({constraint})"
                ));
            }
            if db_err.is_check_violation() {
                return Self::Validation(format!("{operation}: value violates {constraint}"));
            }
        }

        match err {
            sqlx::Error::RowNotFound => Self::NotFound(operation.to_owned()),
            sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
                Self::DataCorruption(format!("{operation}: {err}"))
            }
            sqlx::Error::Io(_)
            | sqlx::Error::Tls(_)
            | sqlx::Error::Protocol(_)
            | sqlx::Error::PoolTimedOut
            | sqlx::Error::PoolClosed
            | sqlx::Error::WorkerCrashed => Self::Transient {
                operation,
                source: err,
            },
            other => Self::Database {
                operation,
                source: other,
            },
        }
    }

    /// Whether retrying the same call could succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }
}

/// Shorthand for `map_err(|e| RepositoryError::from_sqlx(operation, e))`.
pub(crate) fn db_err(operation: &'static str) -> impl FnOnce(sqlx::Error) -> RepositoryError {
    move |err| RepositoryError::from_sqlx(operation, err)
}

/// Create a `PostgreSQL` connection pool.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(max_connections.min(2))
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns `MigrateError` if a migration fails or the applied history diverges.
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    MIGRATOR.run(pool).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err = RepositoryError::from_sqlx("get product", sqlx::Error::RowNotFound);
        assert!(matches!(err, RepositoryError::NotFound(ref op) if op == "get product"));
        assert_eq!(err.to_string(), "get product not found");
    }

    #[test]
    fn test_pool_errors_are_transient() {
        let err = RepositoryError::from_sqlx("list orders", sqlx::Error::PoolTimedOut);
        assert!(err.is_transient());
        assert!(err.to_string().starts_with("list orders: database unavailable"));

        let io = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(RepositoryError::from_sqlx("create order", sqlx::Error::Io(io)).is_transient());
    }

    #[test]
    fn test_other_errors_keep_operation() {
        let err = RepositoryError::from_sqlx(
            "list products",
            sqlx::Error::Configuration("bad".into()),
        );
        assert!(matches!(
            err,
            RepositoryError::Database {
                operation: "list products",
                ..
            }
        ));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_migrations_are_embedded() {
        assert!(MIGRATOR.iter().count() >= 2);
    }
}
