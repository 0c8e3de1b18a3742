//! Runtime values of the FEEL subset
//!
//! Numbers are held as `f64`. Integers bound as inputs are exact up to
//! 2^53 in magnitude; larger `Int64` values are rounded to the nearest
//! representable double when they enter the engine.

use dmn_core::Value;
use indexmap::IndexMap;
use serde::{Serialize, Serializer};
use std::cmp::Ordering;

/// FEEL runtime value
#[derive(Debug, Clone, PartialEq)]
pub enum FeelValue {
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<FeelValue>),
    Context(IndexMap<String, FeelValue>),
}

impl FeelValue {
    /// FEEL equality: same type and same value, `null = null` holds
    pub fn feel_eq(&self, other: &FeelValue) -> bool {
        match (self, other) {
            (FeelValue::Null, FeelValue::Null) => true,
            (FeelValue::Bool(a), FeelValue::Bool(b)) => a == b,
            (FeelValue::Number(a), FeelValue::Number(b)) => a == b,
            (FeelValue::String(a), FeelValue::String(b)) => a == b,
            (FeelValue::List(a), FeelValue::List(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.feel_eq(y))
            }
            (FeelValue::Context(a), FeelValue::Context(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).map(|w| v.feel_eq(w)).unwrap_or(false))
            }
            _ => false,
        }
    }

    /// Ordering between comparable values; `None` when the values are not comparable
    pub fn feel_cmp(&self, other: &FeelValue) -> Option<Ordering> {
        match (self, other) {
            (FeelValue::Number(a), FeelValue::Number(b)) => a.partial_cmp(b),
            (FeelValue::String(a), FeelValue::String(b)) => Some(a.cmp(b)),
            (FeelValue::Bool(a), FeelValue::Bool(b)) if a == b => Some(Ordering::Equal),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FeelValue::Null)
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            FeelValue::Null => "null",
            FeelValue::Bool(_) => "boolean",
            FeelValue::Number(_) => "number",
            FeelValue::String(_) => "string",
            FeelValue::List(_) => "list",
            FeelValue::Context(_) => "context",
        }
    }

    /// Convert into a primitive output value.
    ///
    /// Lists and contexts have no primitive counterpart and are reported as
    /// their JSON text, with integral numbers narrowed as for scalars.
    pub fn into_value(self) -> Value {
        match self {
            FeelValue::Null => Value::Null,
            FeelValue::Bool(b) => Value::Bool(b),
            FeelValue::Number(n) => Value::from_number(n),
            FeelValue::String(s) => Value::Text(s),
            other @ (FeelValue::List(_) | FeelValue::Context(_)) => {
                Value::Raw(serde_json::to_string(&other).unwrap_or_default())
            }
        }
    }
}

impl Serialize for FeelValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FeelValue::Null => serializer.serialize_unit(),
            FeelValue::Bool(b) => serializer.serialize_bool(*b),
            FeelValue::Number(n) => match Value::from_number(*n) {
                Value::Int32(i) => serializer.serialize_i32(i),
                Value::Int64(l) => serializer.serialize_i64(l),
                _ => serializer.serialize_f64(*n),
            },
            FeelValue::String(s) => serializer.serialize_str(s),
            FeelValue::List(items) => serializer.collect_seq(items),
            FeelValue::Context(map) => serializer.collect_map(map),
        }
    }
}

impl From<Value> for FeelValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Text(s) | Value::Raw(s) => FeelValue::String(s),
            Value::Int32(i) => FeelValue::Number(i as f64),
            Value::Int64(l) => FeelValue::Number(l as f64),
            Value::Float(f) => FeelValue::Number(f),
            Value::Bool(b) => FeelValue::Bool(b),
            Value::Null => FeelValue::Null,
        }
    }
}
