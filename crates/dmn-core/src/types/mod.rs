//! Type system for the gateway
//!
//! Only primitive values cross the engine boundary.

pub mod value;

pub use value::Value;
