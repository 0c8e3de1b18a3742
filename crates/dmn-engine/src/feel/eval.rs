//! Evaluation of FEEL expressions and unary tests
//!
//! Evaluation is total: type mismatches, unknown names and division by zero
//! produce `null` instead of an error.

use super::ast::{BinaryOp, Comparison, Expression, PositiveTest, UnaryTests};
use super::value::FeelValue;
use indexmap::IndexMap;
use std::cmp::Ordering;
use tracing::trace;

/// Variables visible to an expression
pub type Variables = IndexMap<String, FeelValue>;

/// Evaluate an expression
pub fn evaluate(expression: &Expression, vars: &Variables) -> FeelValue {
    match expression {
        Expression::Literal(v) => v.clone(),
        Expression::Name(name) => match vars.get(name) {
            Some(v) => v.clone(),
            None => {
                trace!("Unknown name '{}' evaluates to null", name);
                FeelValue::Null
            }
        },
        Expression::Path(base, member) => member_of(evaluate(base, vars), member),
        Expression::Negate(operand) => match evaluate(operand, vars) {
            FeelValue::Number(n) => FeelValue::Number(-n),
            _ => FeelValue::Null,
        },
        Expression::Not(operand) => match evaluate(operand, vars) {
            FeelValue::Bool(b) => FeelValue::Bool(!b),
            _ => FeelValue::Null,
        },
        Expression::Binary { left, op, right } => {
            let l = evaluate(left, vars);
            let r = evaluate(right, vars);
            binary(*op, l, r)
        }
    }
}

fn member_of(base: FeelValue, member: &str) -> FeelValue {
    match base {
        FeelValue::Context(mut map) => map.swap_remove(member).unwrap_or(FeelValue::Null),
        FeelValue::List(items) => {
            FeelValue::List(items.into_iter().map(|item| member_of(item, member)).collect())
        }
        _ => FeelValue::Null,
    }
}

fn binary(op: BinaryOp, l: FeelValue, r: FeelValue) -> FeelValue {
    match op {
        BinaryOp::And => match (l, r) {
            (FeelValue::Bool(false), _) | (_, FeelValue::Bool(false)) => FeelValue::Bool(false),
            (FeelValue::Bool(true), FeelValue::Bool(true)) => FeelValue::Bool(true),
            _ => FeelValue::Null,
        },
        BinaryOp::Or => match (l, r) {
            (FeelValue::Bool(true), _) | (_, FeelValue::Bool(true)) => FeelValue::Bool(true),
            (FeelValue::Bool(false), FeelValue::Bool(false)) => FeelValue::Bool(false),
            _ => FeelValue::Null,
        },
        BinaryOp::Eq => FeelValue::Bool(l.feel_eq(&r)),
        BinaryOp::NotEq => FeelValue::Bool(!l.feel_eq(&r)),
        BinaryOp::Lt => ordering_test(&l, &r, |o| o == Ordering::Less),
        BinaryOp::Le => ordering_test(&l, &r, |o| o != Ordering::Greater),
        BinaryOp::Gt => ordering_test(&l, &r, |o| o == Ordering::Greater),
        BinaryOp::Ge => ordering_test(&l, &r, |o| o != Ordering::Less),
        BinaryOp::Add => match (l, r) {
            (FeelValue::Number(a), FeelValue::Number(b)) => FeelValue::Number(a + b),
            (FeelValue::String(a), FeelValue::String(b)) => FeelValue::String(a + &b),
            _ => FeelValue::Null,
        },
        BinaryOp::Sub => arithmetic(l, r, |a, b| Some(a - b)),
        BinaryOp::Mul => arithmetic(l, r, |a, b| Some(a * b)),
        BinaryOp::Div => arithmetic(l, r, |a, b| if b == 0.0 { None } else { Some(a / b) }),
    }
}

fn ordering_test(l: &FeelValue, r: &FeelValue, test: impl Fn(Ordering) -> bool) -> FeelValue {
    match l.feel_cmp(r) {
        Some(ordering) => FeelValue::Bool(test(ordering)),
        None => FeelValue::Null,
    }
}

fn arithmetic(l: FeelValue, r: FeelValue, f: impl Fn(f64, f64) -> Option<f64>) -> FeelValue {
    match (l, r) {
        (FeelValue::Number(a), FeelValue::Number(b)) => {
            f(a, b).map(FeelValue::Number).unwrap_or(FeelValue::Null)
        }
        _ => FeelValue::Null,
    }
}

/// Check an input value against unary tests
pub fn satisfies(tests: &UnaryTests, input: &FeelValue, vars: &Variables) -> bool {
    match tests {
        UnaryTests::Any => true,
        UnaryTests::Positive(tests) => tests.iter().any(|t| satisfies_test(t, input, vars)),
        UnaryTests::Negated(tests) => !tests.iter().any(|t| satisfies_test(t, input, vars)),
    }
}

fn satisfies_test(test: &PositiveTest, input: &FeelValue, vars: &Variables) -> bool {
    match test {
        PositiveTest::Equal(expression) => match evaluate(expression, vars) {
            FeelValue::List(items) => items.iter().any(|item| input.feel_eq(item)),
            value => input.feel_eq(&value),
        },
        PositiveTest::Compare(comparison, expression) => {
            let value = evaluate(expression, vars);
            let ordering = input.feel_cmp(&value);
            match comparison {
                Comparison::NotEq => !input.feel_eq(&value),
                Comparison::Lt => ordering == Some(Ordering::Less),
                Comparison::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
                Comparison::Gt => ordering == Some(Ordering::Greater),
                Comparison::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
            }
        }
        PositiveTest::Interval { low, high } => {
            let low_value = evaluate(&low.value, vars);
            let high_value = evaluate(&high.value, vars);
            let above_low = match input.feel_cmp(&low_value) {
                Some(Ordering::Greater) => true,
                Some(Ordering::Equal) => low.inclusive,
                _ => false,
            };
            let below_high = match input.feel_cmp(&high_value) {
                Some(Ordering::Less) => true,
                Some(Ordering::Equal) => high.inclusive,
                _ => false,
            };
            above_low && below_high
        }
    }
}
