//! Customer profile.

use chrono::{DateTime, Utc};
use serde::Serialize;
use simple_ecomm_core::{CustomerId, Email, Phone};

/// A registered customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: CustomerId,
    /// Subject identifier issued by the identity provider.
    pub auth_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Phone,
    pub created_at: DateTime<Utc>,
}

/// Fields supplied when creating a customer.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub auth_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub phone: Phone,
}
