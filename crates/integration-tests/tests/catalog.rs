//! Catalog projection and price aggregation against a real database.
//!
//! These tests require a `PostgreSQL` database in `TEST_DATABASE_URL`.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;

use simple_ecomm_api::db::{CatalogRepository, ProductRepository};
use simple_ecomm_core::UNGROUPED;
use simple_ecomm_integration_tests::{create_category, create_product, test_pool, unique};

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_average_price_by_category() {
    let pool = test_pool().await;
    let category = create_category(&pool, &format!("Audio {}", unique()), None).await;
    create_product(&pool, "Speaker", 10_000, Some(category.id)).await;
    create_product(&pool, "Amplifier", 20_000, Some(category.id)).await;

    let avg = ProductRepository::new(&pool)
        .average_price_by_category(category.id)
        .await
        .unwrap();
    assert_eq!(avg, Some(Decimal::new(15_000, 2)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_average_price_rounds_to_cents() {
    let pool = test_pool().await;
    let category = create_category(&pool, &format!("Snacks {}", unique()), None).await;
    for cents in [100, 100, 101] {
        create_product(&pool, "Crisps", cents, Some(category.id)).await;
    }

    // 3.01 / 3 = 1.00333...
    let avg = ProductRepository::new(&pool)
        .average_price_by_category(category.id)
        .await
        .unwrap();
    assert_eq!(avg, Some(Decimal::new(100, 2)));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_average_price_of_empty_category_is_none() {
    let pool = test_pool().await;
    let category = create_category(&pool, &format!("Empty {}", unique()), None).await;

    let avg = ProductRepository::new(&pool)
        .average_price_by_category(category.id)
        .await
        .unwrap();
    assert_eq!(avg, None);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_catalog_nests_products_under_sub_categories() {
    let pool = test_pool().await;
    let top_name = format!("Electronics {}", unique());
    let top = create_category(&pool, &top_name, None).await;
    let sub = create_category(&pool, "Smartphones", Some(top.id)).await;
    let iphone = create_product(&pool, "iPhone 13", 99_900, Some(sub.id)).await;

    let catalog = CatalogRepository::new(&pool).get_catalog().await.unwrap();
    let electronics = catalog
        .iter()
        .find(|t| t.name == top_name)
        .expect("top category present");

    assert_eq!(electronics.sub_categories.len(), 1);
    let smartphones = &electronics.sub_categories[0];
    assert_eq!(smartphones.name, "Smartphones");
    assert_eq!(smartphones.products.len(), 1);
    assert_eq!(smartphones.products[0].id, iphone.id);
    assert_eq!(smartphones.products[0].name, "iPhone 13");
    assert_eq!(smartphones.products[0].price, Some(iphone.price));
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_catalog_keeps_childless_top_category() {
    let pool = test_pool().await;
    let top_name = format!("Garden {}", unique());
    create_category(&pool, &top_name, None).await;

    let catalog = CatalogRepository::new(&pool).get_catalog().await.unwrap();
    let garden = catalog
        .iter()
        .find(|t| t.name == top_name)
        .expect("top category present");

    assert_eq!(garden.sub_categories.len(), 1);
    assert_eq!(garden.sub_categories[0].name, UNGROUPED);
    assert!(garden.sub_categories[0].products.is_empty());
}
