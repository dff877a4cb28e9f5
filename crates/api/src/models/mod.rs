//! Row types returned by the repositories.

pub mod catalog;
pub mod customer;
pub mod order;

pub use catalog::{Category, Product};
pub use customer::{Customer, NewCustomer};
pub use order::{Order, OrderItem, PlacedOrder};
