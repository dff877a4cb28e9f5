//! Customer repository.

use sqlx::PgPool;
use tracing::instrument;

use simple_ecomm_core::{CustomerId, Email, Phone};

use super::{RepositoryError, db_err};
use crate::models::{Customer, NewCustomer};

const CUSTOMER_COLUMNS: &str = "id, auth_id, first_name, last_name, email, phone, created_at";

/// Repository for customer database operations.
pub struct CustomerRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CustomerRepository<'a> {
    /// Create a new customer repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a customer.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the email is already registered.
    /// Returns `RepositoryError::Validation` if a name or the subject id is blank.
    #[instrument(skip(self, new), fields(email = %new.email))]
    pub async fn create(&self, new: &NewCustomer) -> Result<Customer, RepositoryError> {
        for (field, value) in [
            ("auth id", &new.auth_id),
            ("first name", &new.first_name),
            ("last name", &new.last_name),
        ] {
            if value.trim().is_empty() {
                return Err(RepositoryError::Validation(format!("{field} cannot be empty")));
            }
        }

        sqlx::query_as::<_, Customer>(&format!(
            r"
            INSERT INTO customers (auth_id, first_name, last_name, email, phone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {CUSTOMER_COLUMNS}
            "
        ))
        .bind(new.auth_id.trim())
        .bind(new.first_name.trim())
        .bind(new.last_name.trim())
        .bind(&new.email)
        .bind(&new.phone)
        .fetch_one(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref database_err) = e
                && database_err.is_unique_violation()
            {
                return RepositoryError::Conflict(format!(
                    "a customer with email {} already exists",
                    new.email
                ));
            }
            RepositoryError::from_sqlx("create customer", e)
        })
    }

    /// Get a customer by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such customer exists.
    #[instrument(skip(self), fields(customer_id = %id))]
    pub async fn get(&self, id: CustomerId) -> Result<Customer, RepositoryError> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(db_err("get customer"))?
        .ok_or_else(|| RepositoryError::NotFound(format!("customer {id}")))
    }

    /// List every customer, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Customer>, RepositoryError> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await
        .map_err(db_err("list customers"))
    }

    /// Get a customer by exact email match.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_by_email(&self, email: &Email) -> Result<Option<Customer>, RepositoryError> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(self.pool)
        .await
        .map_err(db_err("get customer by email"))
    }

    /// Get the lowest-id customer matching either the email or the phone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_by_email_or_phone(
        &self,
        email: &Email,
        phone: &Phone,
    ) -> Result<Option<Customer>, RepositoryError> {
        sqlx::query_as::<_, Customer>(&format!(
            r"
            SELECT {CUSTOMER_COLUMNS}
            FROM customers
            WHERE email = $1 OR phone = $2
            ORDER BY id
            LIMIT 1
            "
        ))
        .bind(email)
        .bind(phone)
        .fetch_optional(self.pool)
        .await
        .map_err(db_err("get customer by email or phone"))
    }

    /// Get the lowest-id customer linked to an identity-provider subject.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_by_auth_id(&self, auth_id: &str) -> Result<Option<Customer>, RepositoryError> {
        sqlx::query_as::<_, Customer>(&format!(
            "SELECT {CUSTOMER_COLUMNS} FROM customers WHERE auth_id = $1 ORDER BY id LIMIT 1"
        ))
        .bind(auth_id)
        .fetch_optional(self.pool)
        .await
        .map_err(db_err("get customer by auth id"))
    }
}
