//! simple-ecomm API server library.
//!
//! GraphQL over a `PostgreSQL` catalog, customer and order store, plus REST
//! account endpoints backed by Auth0 and SMS order confirmations through
//! Africa's Talking.
//!
//! The binary in `main.rs` wires these modules together; the CLI and the
//! integration tests use them directly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod graphql;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

pub use config::ApiConfig;
pub use error::AppError;
pub use state::AppState;
