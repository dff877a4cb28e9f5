//! Product repository.

use rust_decimal::{Decimal, RoundingStrategy};
use sqlx::PgPool;
use tracing::instrument;

use simple_ecomm_core::{CategoryId, Price, ProductId};

use super::{RepositoryError, db_err};
use crate::models::Product;

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for a blank name,
    /// `RepositoryError::InvalidReference` if the category does not exist.
    #[instrument(skip(self, description))]
    pub async fn create(
        &self,
        name: &str,
        description: Option<&str>,
        price: Price,
        category_id: Option<CategoryId>,
    ) -> Result<Product, RepositoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::Validation(
                "product name cannot be empty".to_owned(),
            ));
        }

        sqlx::query_as::<_, Product>(
            r"
            INSERT INTO products (name, description, price, category_id)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, description, price, category_id
            ",
        )
        .bind(name)
        .bind(description)
        .bind(price)
        .bind(category_id)
        .fetch_one(self.pool)
        .await
        .map_err(db_err("create product"))
    }

    /// Get a product by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such product exists.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: ProductId) -> Result<Product, RepositoryError> {
        sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, category_id FROM products WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(db_err("get product"))?
        .ok_or_else(|| RepositoryError::NotFound(format!("product {id}")))
    }

    /// List every product, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Product>, RepositoryError> {
        sqlx::query_as::<_, Product>(
            "SELECT id, name, description, price, category_id FROM products ORDER BY id",
        )
        .fetch_all(self.pool)
        .await
        .map_err(db_err("list products"))
    }

    /// List the products filed directly under a category.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Vec<Product>, RepositoryError> {
        sqlx::query_as::<_, Product>(
            r"
            SELECT id, name, description, price, category_id
            FROM products
            WHERE category_id = $1
            ORDER BY id
            ",
        )
        .bind(category_id)
        .fetch_all(self.pool)
        .await
        .map_err(db_err("list products by category"))
    }

    /// Average list price of the products directly in a category.
    ///
    /// Rounded half-away-from-zero to two places. `None` when the category has
    /// no products (or does not exist).
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn average_price_by_category(
        &self,
        category_id: CategoryId,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let avg: Option<Decimal> =
            sqlx::query_scalar("SELECT AVG(price) FROM products WHERE category_id = $1")
                .bind(category_id)
                .fetch_one(self.pool)
                .await
                .map_err(db_err("average price by category"))?;

        Ok(avg.map(|a| a.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)))
    }
}
