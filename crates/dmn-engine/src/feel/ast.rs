//! Syntax tree of the FEEL subset

use super::value::FeelValue;

/// Binary operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Eq,
    NotEq,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
}

/// Comparison used by a unary test such as `< 10`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
    NotEq,
}

/// Expression
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(FeelValue),
    /// Variable reference, possibly a multi-word name
    Name(String),
    /// Member access `base.member`
    Path(Box<Expression>, String),
    Negate(Box<Expression>),
    Not(Box<Expression>),
    Binary {
        left: Box<Expression>,
        op: BinaryOp,
        right: Box<Expression>,
    },
}

impl Expression {
    pub fn binary(left: Expression, op: BinaryOp, right: Expression) -> Self {
        Expression::Binary {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    /// Height of the syntax tree, a leaf counting as 1
    pub fn depth(&self) -> usize {
        match self {
            Expression::Literal(_) | Expression::Name(_) => 1,
            Expression::Path(base, _) => base.depth() + 1,
            Expression::Negate(operand) | Expression::Not(operand) => operand.depth() + 1,
            Expression::Binary { left, right, .. } => left.depth().max(right.depth()) + 1,
        }
    }

    /// Value of the expression when it does not depend on any variable
    pub fn constant(&self) -> Option<&FeelValue> {
        match self {
            Expression::Literal(v) => Some(v),
            _ => None,
        }
    }
}

/// Interval bound
#[derive(Debug, Clone, PartialEq)]
pub struct Bound {
    pub value: Expression,
    pub inclusive: bool,
}

/// One test of a unary test list
#[derive(Debug, Clone, PartialEq)]
pub enum PositiveTest {
    /// Input equals the value (or is contained in it, for lists)
    Equal(Expression),
    Compare(Comparison, Expression),
    Interval { low: Bound, high: Bound },
}

/// Unary tests of an input entry
#[derive(Debug, Clone, PartialEq)]
pub enum UnaryTests {
    /// `-`, matches everything
    Any,
    /// Matches when any test matches
    Positive(Vec<PositiveTest>),
    /// `not(...)`, matches when no test matches
    Negated(Vec<PositiveTest>),
}
