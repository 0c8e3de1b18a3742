//! Primitive values exchanged with a decision engine
//!
//! The `Value` enum is the closed set of shapes an input may take after
//! coercion, and the shape of every output variable reported back.

use serde::Serialize;
use std::fmt;

/// Primitive value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    /// Text value
    Text(String),
    /// 32-bit signed integer
    Int32(i32),
    /// 64-bit signed integer
    Int64(i64),
    /// Double-precision float
    Float(f64),
    /// Boolean value
    Bool(bool),
    /// Null value
    Null,
    /// Textual fallback for values that could not be classified
    Raw(String),
}

impl Value {
    /// Build the narrowest numeric value for `n`.
    ///
    /// Integral values are reported as `Int32` or `Int64` when they fit,
    /// everything else stays a float.
    pub fn from_number(n: f64) -> Self {
        if n.is_finite() && n.fract() == 0.0 {
            if n >= i32::MIN as f64 && n <= i32::MAX as f64 {
                return Value::Int32(n as i32);
            }
            if n >= i64::MIN as f64 && n < i64::MAX as f64 {
                return Value::Int64(n as i64);
            }
        }
        Value::Float(n)
    }

    /// Numeric view of the value, if it is a number
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int32(i) => Some(*i as f64),
            Value::Int64(l) => Some(*l as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Text view of the value, if it is text
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) | Value::Raw(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Name of the variant, used in log lines and error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Text(_) => "text",
            Value::Int32(_) => "int32",
            Value::Int64(_) => "int64",
            Value::Float(_) => "float",
            Value::Bool(_) => "bool",
            Value::Null => "null",
            Value::Raw(_) => "raw",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Text(s) | Value::Raw(s) => write!(f, "{}", s),
            Value::Int32(i) => write!(f, "{}", i),
            Value::Int64(l) => write!(f, "{}", l),
            Value::Float(n) => write!(f, "{}", n),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Null => write!(f, "null"),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int32(i)
    }
}

impl From<i64> for Value {
    fn from(l: i64) -> Self {
        Value::Int64(l)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(Value::Null)
    }
}
