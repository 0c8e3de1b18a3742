//! FEEL subset used by decision tables and literal expressions

pub mod ast;
pub mod eval;
pub mod lexer;
pub mod parser;
pub mod value;

pub use ast::{Expression, UnaryTests};
pub use eval::{evaluate, satisfies, Variables};
pub use parser::{parse_expression, parse_expression_list, parse_unary_tests};
pub use value::FeelValue;

use thiserror::Error;

/// FEEL syntax error
#[derive(Error, Debug, Clone, PartialEq)]
#[error("FEEL syntax error: {message} at position {position} in '{text}'")]
pub struct FeelError {
    pub message: String,
    pub position: usize,
    pub text: String,
}

impl FeelError {
    pub fn syntax(message: impl Into<String>, position: usize, text: &str) -> Self {
        Self {
            message: message.into(),
            position,
            text: text.to_string(),
        }
    }
}
