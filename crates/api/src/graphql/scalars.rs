//! Custom scalars.

use async_graphql::{InputValueError, InputValueResult, Scalar, ScalarType, Value};

use simple_ecomm_core::Price;

/// A price with at most two decimal places.
///
/// Serialized as a string (`"999.99"`) so clients never see float rounding.
/// Accepts a string or a number on input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Money(pub Price);

#[Scalar(name = "Money")]
impl ScalarType for Money {
    fn parse(value: Value) -> InputValueResult<Self> {
        let text = match &value {
            Value::String(s) => s.clone(),
            Value::Number(n) => n.to_string(),
            _ => return Err(InputValueError::expected_type(value)),
        };
        text.parse::<Price>()
            .map(Self)
            .map_err(InputValueError::custom)
    }

    fn is_valid(value: &Value) -> bool {
        matches!(value, Value::String(_) | Value::Number(_))
    }

    fn to_value(&self) -> Value {
        Value::String(self.0.to_string())
    }
}

impl From<Price> for Money {
    fn from(price: Price) -> Self {
        Self(price)
    }
}
