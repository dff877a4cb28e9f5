//! Simple Ecomm Core - Shared domain types and pure logic.
//!
//! This crate provides the types used across all simple-ecomm components:
//! - `api` - GraphQL gateway, REST auth endpoints and repositories
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. The optional `postgres` feature adds `sqlx`
//! encode/decode support so the same types can be bound and fetched directly.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, contact details and order status
//! - [`order`] - Order line input and the business rules applied before persisting
//! - [`catalog`] - Nested catalog projection built from flat join rows

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod order;
pub mod types;

pub use catalog::{CatalogProduct, CatalogRow, SubCategory, TopCategory, UNGROUPED, build_catalog};
pub use order::{NewOrderLine, OrderLineError, validate_order_lines};
pub use types::*;
