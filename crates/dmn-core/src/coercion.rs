//! Value coercion
//!
//! Inputs arrive as generic JSON and are narrowed to primitive `Value`s
//! before binding. Numbers take the narrowest type that holds them:
//! `Int32`, then `Int64`, then `Float`, and finally the raw number text.
//! Arrays and objects are not recursed into; they become their compact JSON
//! text.

use crate::types::Value;
use serde_json::Number;

/// Conversion into a primitive engine value.
///
/// Implemented for native `Value`s (identity) and for JSON values.
pub trait Coerce {
    fn coerce(self) -> Value;
}

impl Coerce for Value {
    fn coerce(self) -> Value {
        self
    }
}

impl Coerce for serde_json::Value {
    fn coerce(self) -> Value {
        match self {
            serde_json::Value::String(s) => Value::Text(s),
            serde_json::Value::Number(n) => coerce_number(&n),
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Null => Value::Null,
            other @ (serde_json::Value::Array(_) | serde_json::Value::Object(_)) => {
                Value::Raw(other.to_string())
            }
        }
    }
}

impl Coerce for &serde_json::Value {
    fn coerce(self) -> Value {
        self.clone().coerce()
    }
}

/// Coerce any supported raw value
pub fn coerce<T: Coerce>(raw: T) -> Value {
    raw.coerce()
}

/// Narrowest-fit number coercion
fn coerce_number(n: &Number) -> Value {
    if let Some(l) = n.as_i64() {
        return match i32::try_from(l) {
            Ok(i) => Value::Int32(i),
            Err(_) => Value::Int64(l),
        };
    }

    let text = n.to_string();

    // Integral literals outside i64 are kept as text instead of losing precision
    if !text.contains(['.', 'e', 'E']) {
        return Value::Raw(text);
    }

    match text.parse::<f64>() {
        Ok(f) if f.is_finite() => Value::Float(f),
        _ => Value::Raw(text),
    }
}
