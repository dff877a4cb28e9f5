//! Seed the catalog from a YAML file.
//!
//! ```yaml
//! categories:
//!   - name: Electronics
//!     sub_categories:
//!       - name: Smartphones
//!         products:
//!           - name: iPhone 13
//!             description: Apple smartphone
//!             price: "999.00"
//!   - name: Books
//!     products:
//!       - name: Rust in Action
//!         price: "39.99"
//! ```
//!
//! The whole file is validated before connecting, then inserted inside one
//! transaction. A failure part-way leaves the database untouched.

use std::path::Path;

use serde::Deserialize;
use sqlx::{Postgres, Transaction};
use tracing::{error, info};

use simple_ecomm_api::db;
use simple_ecomm_core::{CategoryId, Price};

use super::database_url;

/// Top level of a catalog file.
#[derive(Debug, Deserialize)]
pub struct CatalogFile {
    pub categories: Vec<SeedCategory>,
}

/// A top-level category with optional children and products of its own.
#[derive(Debug, Deserialize)]
pub struct SeedCategory {
    pub name: String,
    #[serde(default)]
    pub sub_categories: Vec<SeedSubCategory>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// A sub-category filed under a top-level category.
#[derive(Debug, Deserialize)]
pub struct SeedSubCategory {
    pub name: String,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// A product. The price is kept as text so a bad value can be reported with
/// the product it belongs to.
#[derive(Debug, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub description: Option<String>,
    pub price: String,
}

/// Counts of inserted rows.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub categories: usize,
    pub products: usize,
}

/// Check names and prices across the whole file.
///
/// Returns one message per problem; an empty list means the file is usable.
#[must_use]
pub fn validate_catalog(file: &CatalogFile) -> Vec<String> {
    let mut errors = Vec::new();

    if file.categories.is_empty() {
        errors.push("no categories defined".to_owned());
    }

    for category in &file.categories {
        if category.name.trim().is_empty() {
            errors.push("category with an empty name".to_owned());
        }
        check_products(&category.name, &category.products, &mut errors);

        for sub in &category.sub_categories {
            let path = format!("{} > {}", category.name, sub.name);
            if sub.name.trim().is_empty() {
                errors.push(format!("{}: sub-category with an empty name", category.name));
            }
            check_products(&path, &sub.products, &mut errors);
        }
    }

    errors
}

fn check_products(path: &str, products: &[SeedProduct], errors: &mut Vec<String>) {
    for product in products {
        if product.name.trim().is_empty() {
            errors.push(format!("{path}: product with an empty name"));
        }
        if let Err(e) = product.price.trim().parse::<Price>() {
            errors.push(format!("{path} > {}: {e}", product.name));
        }
    }
}

/// Load a catalog file and insert it.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, fails validation,
/// or the database rejects an insert.
pub async fn catalog(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let database_url = database_url()?;

    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading catalog from file");
    let content = tokio::fs::read_to_string(path).await?;
    let file: CatalogFile = serde_yaml::from_str(&content)?;

    let errors = validate_catalog(&file);
    if !errors.is_empty() {
        error!("Catalog validation failed:");
        for err in &errors {
            error!("  - {err}");
        }
        return Err(format!("{} validation errors found", errors.len()).into());
    }

    let pool = db::create_pool(&database_url, 2).await?;
    info!("Connected to database");

    let mut tx = pool.begin().await?;
    let summary = insert_catalog(&mut tx, &file).await?;
    tx.commit().await?;

    info!("Seeding complete!");
    info!("  Categories inserted: {}", summary.categories);
    info!("  Products inserted: {}", summary.products);
    Ok(())
}

async fn insert_catalog(
    tx: &mut Transaction<'_, Postgres>,
    file: &CatalogFile,
) -> Result<SeedSummary, sqlx::Error> {
    let mut summary = SeedSummary::default();

    for category in &file.categories {
        let top_id = insert_category(tx, &category.name, None).await?;
        summary.categories += 1;
        summary.products += insert_products(tx, top_id, &category.products).await?;

        for sub in &category.sub_categories {
            let sub_id = insert_category(tx, &sub.name, Some(top_id)).await?;
            summary.categories += 1;
            summary.products += insert_products(tx, sub_id, &sub.products).await?;
        }
    }

    Ok(summary)
}

async fn insert_category(
    tx: &mut Transaction<'_, Postgres>,
    name: &str,
    parent_id: Option<CategoryId>,
) -> Result<CategoryId, sqlx::Error> {
    sqlx::query_scalar::<_, CategoryId>(
        "INSERT INTO categories (name, parent_id) VALUES ($1, $2) RETURNING id",
    )
    .bind(name.trim())
    .bind(parent_id)
    .fetch_one(&mut **tx)
    .await
}

async fn insert_products(
    tx: &mut Transaction<'_, Postgres>,
    category_id: CategoryId,
    products: &[SeedProduct],
) -> Result<usize, sqlx::Error> {
    for product in products {
        // Prices were checked by validate_catalog.
        let price: Price = product
            .price
            .trim()
            .parse()
            .map_err(|e| sqlx::Error::Protocol(format!("{}: {e}", product.name)))?;

        sqlx::query(
            "INSERT INTO products (name, description, price, category_id) VALUES ($1, $2, $3, $4)",
        )
        .bind(product.name.trim())
        .bind(product.description.as_deref())
        .bind(price)
        .bind(category_id)
        .execute(&mut **tx)
        .await?;
    }
    Ok(products.len())
}
