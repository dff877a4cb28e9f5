//! Order repository.
//!
//! Creating an order is the only multi-statement write in the system: the
//! header and every line item are inserted in one transaction. If any insert
//! fails the transaction is dropped without commit and Postgres rolls it back,
//! so a partially written order is never visible.

use sqlx::PgPool;
use tracing::{debug, info, instrument};

use simple_ecomm_core::{CustomerId, NewOrderLine, OrderId, OrderStatus, validate_order_lines};

use super::{RepositoryError, db_err};
use crate::models::{Order, OrderItem, PlacedOrder};

/// Repository for orders and their line items.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Create an order and all of its line items atomically.
    ///
    /// The lines are validated before a connection is taken. The customer and
    /// product references are checked by the store's foreign keys.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Validation` if `lines` is empty or a line is
    /// invalid, `RepositoryError::InvalidReference` for an unknown customer or
    /// product, `RepositoryError::Transient` if the connection fails. In every
    /// error case nothing is written.
    #[instrument(skip(self, lines), fields(items = lines.len()))]
    pub async fn create(
        &self,
        customer_id: CustomerId,
        lines: &[NewOrderLine],
    ) -> Result<PlacedOrder, RepositoryError> {
        validate_order_lines(lines).map_err(|e| RepositoryError::Validation(e.to_string()))?;

        let mut tx = self.pool.begin().await.map_err(db_err("create order"))?;

        let order = sqlx::query_as::<_, Order>(
            r"
            INSERT INTO orders (customer_id)
            VALUES ($1)
            RETURNING id, customer_id, order_date, status
            ",
        )
        .bind(customer_id)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_err("create order"))?;

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let item = sqlx::query_as::<_, OrderItem>(
                r"
                INSERT INTO order_items (order_id, product_id, quantity, price)
                VALUES ($1, $2, $3, $4)
                RETURNING id, order_id, product_id, quantity, price
                ",
            )
            .bind(order.id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .fetch_one(&mut *tx)
            .await
            .map_err(db_err("create order item"))?;
            debug!(order_id = %order.id, product_id = %item.product_id, "Order item inserted");
            items.push(item);
        }

        tx.commit().await.map_err(db_err("commit order"))?;

        info!(order_id = %order.id, items = items.len(), "Order created");
        Ok(PlacedOrder { order, items })
    }

    /// Get an order header by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no such order exists.
    #[instrument(skip(self), fields(order_id = %id))]
    pub async fn get(&self, id: OrderId) -> Result<Order, RepositoryError> {
        sqlx::query_as::<_, Order>(
            "SELECT id, customer_id, order_date, status FROM orders WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await
        .map_err(db_err("get order"))?
        .ok_or_else(|| RepositoryError::NotFound(format!("order {id}")))
    }

    /// List every order, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        sqlx::query_as::<_, Order>(
            "SELECT id, customer_id, order_date, status FROM orders ORDER BY id",
        )
        .fetch_all(self.pool)
        .await
        .map_err(db_err("list orders"))
    }

    /// List a customer's orders, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn list_by_customer(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<Order>, RepositoryError> {
        sqlx::query_as::<_, Order>(
            r"
            SELECT id, customer_id, order_date, status
            FROM orders
            WHERE customer_id = $1
            ORDER BY id
            ",
        )
        .bind(customer_id)
        .fetch_all(self.pool)
        .await
        .map_err(db_err("list orders by customer"))
    }

    /// Get the line items of an order, ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    #[instrument(skip(self))]
    pub async fn get_items(&self, order_id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        sqlx::query_as::<_, OrderItem>(
            r"
            SELECT id, order_id, product_id, quantity, price
            FROM order_items
            WHERE order_id = $1
            ORDER BY id
            ",
        )
        .bind(order_id)
        .fetch_all(self.pool)
        .await
        .map_err(db_err("get order items"))
    }

    /// Set an order's status.
    ///
    /// Any status may replace any other.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no row was updated.
    #[instrument(skip(self))]
    pub async fn update_status(
        &self,
        order_id: OrderId,
        status: OrderStatus,
    ) -> Result<Order, RepositoryError> {
        let order = sqlx::query_as::<_, Order>(
            r"
            UPDATE orders
            SET status = $2
            WHERE id = $1
            RETURNING id, customer_id, order_date, status
            ",
        )
        .bind(order_id)
        .bind(status)
        .fetch_optional(self.pool)
        .await
        .map_err(db_err("update order status"))?
        .ok_or_else(|| RepositoryError::NotFound(format!("order {order_id}")))?;

        info!(order_id = %order.id, status = %order.status, "Order status updated");
        Ok(order)
    }
}
