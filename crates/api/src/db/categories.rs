//! Category repository.

use sqlx::PgPool;
use tracing::instrument;

use simple_ecomm_core::CategoryId;

use super::{RepositoryError, db_err};
use crate::models::Category;

/// Repository for the self-referencing category tree.
pub struct CategoryRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CategoryRepository<'a> {
    /// Create a new category repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create a category, optionally under an existing parent.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` for a blank name,
    /// `RepositoryError::InvalidReference` if the parent does not exist.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        name: &str,
        parent_id: Option<CategoryId>,
    ) -> Result<Category, RepositoryError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RepositoryError::Validation(
                "category name cannot be empty".to_owned(),
            ));
        }

        sqlx::query_as::<_, Category>(
            r"
            INSERT INTO categories (name, parent_id)
            VALUES ($1, $2)
            RETURNING id, name, parent_id
            ",
        )
        .bind(name)
        .bind(parent_id)
        .fetch_one(self.pool)
        .await
        .map_err(db_err("create category"))
    }

    /// Get a category by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such category exists.
    #[instrument(skip(self), fields(category_id = %id))]
    pub async fn get(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        sqlx::query_as::<_, Category>("SELECT id, name, parent_id FROM categories WHERE id = $1")
            .bind(id)
            .fetch_optional(self.pool)
            .await
            .map_err(db_err("get category"))?
            .ok_or_else(|| RepositoryError::NotFound(format!("category {id}")))
    }

    /// List every category, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Category>, RepositoryError> {
        sqlx::query_as::<_, Category>("SELECT id, name, parent_id FROM categories ORDER BY id")
            .fetch_all(self.pool)
            .await
            .map_err(db_err("list categories"))
    }

    /// List the direct children of a category, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_children(
        &self,
        parent_id: CategoryId,
    ) -> Result<Vec<Category>, RepositoryError> {
        sqlx::query_as::<_, Category>(
            "SELECT id, name, parent_id FROM categories WHERE parent_id = $1 ORDER BY id",
        )
        .bind(parent_id)
        .fetch_all(self.pool)
        .await
        .map_err(db_err("list child categories"))
    }
}
