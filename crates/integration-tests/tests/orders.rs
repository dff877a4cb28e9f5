//! Order placement and status updates against a real database.
//!
//! These tests require a `PostgreSQL` database in `TEST_DATABASE_URL`.
//!
//! Run with: cargo test -p simple-ecomm-integration-tests -- --ignored

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use rust_decimal::Decimal;

use simple_ecomm_api::db::{OrderRepository, RepositoryError};
use simple_ecomm_api::services::{OrderError, OrderService};
use simple_ecomm_core::{CustomerId, NewOrderLine, OrderId, OrderStatus, ProductId};
use sqlx::PgPool;

use simple_ecomm_integration_tests::{
    FailingNotifier, RecordingNotifier, create_customer, create_product, test_pool,
};

async fn count_items_for(pool: &PgPool, product: ProductId) -> i64 {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM order_items WHERE product_id = $1")
        .bind(product)
        .fetch_one(pool)
        .await
        .unwrap()
}

// =============================================================================
// Placement
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_place_order_writes_every_line() {
    let pool = test_pool().await;
    let notifier = RecordingNotifier::default();
    let customer = create_customer(&pool, "Wanjiru").await;
    let phone = create_product(&pool, "Phone", 99_900, None).await;
    let case = create_product(&pool, "Case", 1_550, None).await;

    let lines = vec![
        NewOrderLine::new(phone.id, 1, Decimal::new(99_900, 2)).unwrap(),
        NewOrderLine::new(case.id, 3, Decimal::new(1_500, 2)).unwrap(),
    ];

    let placed = OrderService::new(&pool, &notifier)
        .place_order(customer.id, &lines)
        .await
        .expect("order should be placed");

    assert_eq!(placed.order.customer_id, customer.id);
    assert_eq!(placed.order.status, OrderStatus::Pending);
    assert_eq!(placed.items.len(), 2);

    // The unit price paid is stored, not the catalog price.
    let stored = OrderRepository::new(&pool)
        .get_items(placed.order.id)
        .await
        .unwrap();
    assert_eq!(stored.len(), 2);
    let case_line = stored.iter().find(|i| i.product_id == case.id).unwrap();
    assert_eq!(case_line.quantity, 3);
    assert_eq!(case_line.price.amount(), Decimal::new(1_500, 2));

    let orders = OrderRepository::new(&pool)
        .list_by_customer(customer.id)
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].id, placed.order.id);

    assert_eq!(
        notifier.sent(),
        vec![(customer.phone.as_str().to_owned(), "Wanjiru".to_owned())]
    );
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_failed_confirmation_keeps_order() {
    let pool = test_pool().await;
    let notifier = FailingNotifier::default();
    let customer = create_customer(&pool, "Kamau").await;
    let product = create_product(&pool, "Speaker", 7_500, None).await;
    let lines = vec![NewOrderLine::new(product.id, 2, Decimal::new(7_500, 2)).unwrap()];

    let placed = OrderService::new(&pool, &notifier)
        .place_order(customer.id, &lines)
        .await
        .expect("a failed SMS must not fail the order");
    assert_eq!(notifier.attempts(), 1);

    let repo = OrderRepository::new(&pool);
    let order = repo.get(placed.order.id).await.unwrap();
    assert_eq!(order.customer_id, customer.id);
    assert_eq!(order.status, OrderStatus::Pending);

    let items = repo.get_items(placed.order.id).await.unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].product_id, product.id);
    assert_eq!(items[0].quantity, 2);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_unknown_product_rolls_back_whole_order() {
    let pool = test_pool().await;
    let notifier = RecordingNotifier::default();
    let customer = create_customer(&pool, "Otieno").await;
    let product = create_product(&pool, "Charger", 2_000, None).await;

    let lines = vec![
        NewOrderLine::new(product.id, 1, Decimal::new(2_000, 2)).unwrap(),
        NewOrderLine::new(ProductId::new(i32::MAX), 1, Decimal::new(100, 2)).unwrap(),
    ];

    let items_before = count_items_for(&pool, product.id).await;

    let err = OrderService::new(&pool, &notifier)
        .place_order(customer.id, &lines)
        .await
        .unwrap_err();
    assert!(
        matches!(err, OrderError::Repository(RepositoryError::InvalidReference(_))),
        "unexpected error: {err:?}"
    );

    let orders = OrderRepository::new(&pool)
        .list_by_customer(customer.id)
        .await
        .unwrap();
    assert!(orders.is_empty(), "header must not survive a failed line");
    assert_eq!(
        count_items_for(&pool, product.id).await,
        items_before,
        "no line may survive a failed order"
    );
    assert!(notifier.sent().is_empty());
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_unknown_customer_rejected() {
    let pool = test_pool().await;
    let notifier = RecordingNotifier::default();
    let product = create_product(&pool, "Cable", 500, None).await;

    let lines = vec![NewOrderLine::new(product.id, 1, Decimal::new(500, 2)).unwrap()];
    let err = OrderService::new(&pool, &notifier)
        .place_order(CustomerId::new(i32::MAX), &lines)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderError::Repository(RepositoryError::InvalidReference(_))
    ));
}

// =============================================================================
// Status
// =============================================================================

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_update_status_persists() {
    let pool = test_pool().await;
    let notifier = RecordingNotifier::default();
    let customer = create_customer(&pool, "Achieng").await;
    let product = create_product(&pool, "Headphones", 4_999, None).await;
    let lines = vec![NewOrderLine::new(product.id, 2, Decimal::new(4_999, 2)).unwrap()];

    let service = OrderService::new(&pool, &notifier);
    let placed = service.place_order(customer.id, &lines).await.unwrap();

    let updated = service
        .update_status(placed.order.id, "shipped")
        .await
        .unwrap();
    assert_eq!(updated.status, OrderStatus::Shipped);

    let reloaded = OrderRepository::new(&pool).get(placed.order.id).await.unwrap();
    assert_eq!(reloaded.status, OrderStatus::Shipped);
    assert_eq!(reloaded.order_date, placed.order.order_date);
}

#[tokio::test]
#[ignore = "Requires PostgreSQL (TEST_DATABASE_URL)"]
async fn test_update_status_unknown_order_is_not_found() {
    let pool = test_pool().await;
    let notifier = RecordingNotifier::default();

    let err = OrderService::new(&pool, &notifier)
        .update_status(OrderId::new(i32::MAX), "delivered")
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        OrderError::Repository(RepositoryError::NotFound(_))
    ));
}
