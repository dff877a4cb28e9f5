//! Catalog projection query.

use sqlx::PgPool;
use tracing::{debug, instrument};

use simple_ecomm_core::{CatalogRow, TopCategory, build_catalog};

use super::{RepositoryError, db_err};

/// Top-level categories, their direct children, and the children's products.
///
/// The ORDER BY fixes the output order of the projection.
const CATALOG_QUERY: &str = r"
    SELECT
        top_cat.name   AS top_category,
        sub_cat.name   AS sub_category,
        p.id           AS product_id,
        p.name         AS product_name,
        p.description  AS description,
        p.price        AS price
    FROM categories top_cat
    LEFT JOIN categories sub_cat ON sub_cat.parent_id = top_cat.id
    LEFT JOIN products p ON p.category_id = sub_cat.id
    WHERE top_cat.parent_id IS NULL
    ORDER BY top_cat.id, sub_cat.id, p.name
";

/// Read-only access to the nested catalog view.
pub struct CatalogRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CatalogRepository<'a> {
    /// Create a new catalog repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Load the full catalog with a single query.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_catalog(&self) -> Result<Vec<TopCategory>, RepositoryError> {
        let rows = sqlx::query_as::<_, CatalogRow>(CATALOG_QUERY)
            .fetch_all(self.pool)
            .await
            .map_err(db_err("get catalog"))?;

        debug!(rows = rows.len(), "Catalog rows fetched");
        Ok(build_catalog(rows))
    }
}
