//! Order line input and the rules it must satisfy before an order is written.
//!
//! These checks run before the transaction is opened. The database enforces the
//! same constraints (`CHECK (quantity > 0)`, `CHECK (price >= 0)`), but an
//! empty item list is only a business rule, so it has to be caught here.

use serde::{Deserialize, Serialize};

use crate::types::{Price, PriceError, ProductId};

/// One requested line of a new order.
///
/// The unit price is captured as submitted; it becomes the line's stored price
/// regardless of what the product costs later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrderLine {
    pub product_id: ProductId,
    pub quantity: i32,
    pub unit_price: Price,
}

impl NewOrderLine {
    /// Build a line, validating quantity and price.
    ///
    /// # Errors
    ///
    /// Returns [`OrderLineError::NonPositiveQuantity`] or
    /// [`OrderLineError::InvalidPrice`] (with `index` 0; callers validating a
    /// whole list should use [`validate_order_lines`]).
    pub fn new(
        product_id: ProductId,
        quantity: i32,
        unit_price: rust_decimal::Decimal,
    ) -> Result<Self, OrderLineError> {
        let line = Self {
            product_id,
            quantity,
            unit_price: Price::new(unit_price)
                .map_err(|source| OrderLineError::InvalidPrice { index: 0, source })?,
        };
        line.check(0)?;
        Ok(line)
    }

    /// Line total (`quantity * unit_price`).
    #[must_use]
    pub fn total(&self) -> rust_decimal::Decimal {
        self.unit_price.amount() * rust_decimal::Decimal::from(self.quantity)
    }

    fn check(&self, index: usize) -> Result<(), OrderLineError> {
        if self.quantity <= 0 {
            return Err(OrderLineError::NonPositiveQuantity {
                index,
                quantity: self.quantity,
            });
        }
        Ok(())
    }
}

/// Why a set of order lines was refused.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum OrderLineError {
    /// An order needs at least one line.
    #[error("order must contain at least one item")]
    Empty,
    /// Quantity was zero or negative.
    #[error("item {index}: quantity must be greater than zero (got {quantity})")]
    NonPositiveQuantity {
        /// Position of the offending line.
        index: usize,
        /// The rejected quantity.
        quantity: i32,
    },
    /// Unit price failed validation.
    #[error("item {index}: {source}")]
    InvalidPrice {
        /// Position of the offending line.
        index: usize,
        /// Underlying price error.
        source: PriceError,
    },
}

/// Check every line of a prospective order.
///
/// Reports the first problem found, scanning in submission order.
///
/// # Errors
///
/// Returns [`OrderLineError::Empty`] for an empty slice, otherwise the first
/// per-line error.
pub fn validate_order_lines(lines: &[NewOrderLine]) -> Result<(), OrderLineError> {
    if lines.is_empty() {
        return Err(OrderLineError::Empty);
    }
    lines
        .iter()
        .enumerate()
        .try_for_each(|(index, line)| line.check(index))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;

    fn line(product: i32, quantity: i32, cents: i64) -> NewOrderLine {
        NewOrderLine {
            product_id: ProductId::new(product),
            quantity,
            unit_price: Price::from_cents(cents).unwrap(),
        }
    }

    #[test]
    fn test_empty_order_rejected() {
        assert_eq!(validate_order_lines(&[]), Err(OrderLineError::Empty));
    }

    #[test]
    fn test_valid_lines_accepted() {
        let lines = [line(1, 2, 69_999), line(2, 1, 0)];
        assert!(validate_order_lines(&lines).is_ok());
    }

    #[test]
    fn test_zero_quantity_reports_index() {
        let lines = [line(1, 1, 100), line(2, 0, 100), line(3, -1, 100)];
        assert_eq!(
            validate_order_lines(&lines),
            Err(OrderLineError::NonPositiveQuantity {
                index: 1,
                quantity: 0
            })
        );
    }

    #[test]
    fn test_new_rejects_bad_price() {
        let err = NewOrderLine::new(ProductId::new(1), 1, Decimal::new(-500, 2)).unwrap_err();
        assert!(matches!(
            err,
            OrderLineError::InvalidPrice {
                source: PriceError::Negative(_),
                ..
            }
        ));
    }

    #[test]
    fn test_new_rejects_bad_quantity() {
        let err = NewOrderLine::new(ProductId::new(1), 0, Decimal::ONE).unwrap_err();
        assert!(matches!(err, OrderLineError::NonPositiveQuantity { .. }));
    }

    #[test]
    fn test_line_total() {
        let l = line(1, 2, 69_999);
        assert_eq!(l.total(), Decimal::new(139_998, 2));
    }
}
