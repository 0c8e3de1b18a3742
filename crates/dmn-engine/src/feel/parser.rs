//! Recursive-descent parser for the FEEL subset
//!
//! Supported syntax:
//! - Literals: `42`, `3.5`, `"text"`, `true`, `false`, `null`
//! - Names, including multi-word names: `age`, `Applicant Age`
//! - Member access: `applicant.age`
//! - Arithmetic: `+`, `-`, `*`, `/`
//! - Comparisons: `=`, `!=`, `<`, `<=`, `>`, `>=`
//! - Logic: `and`, `or`, `not(...)`
//! - Unary tests: `-`, `< 10`, `"a", "b"`, `[1..5]`, `]1..5[`, `(1..5)`, `not(...)`

use super::ast::{BinaryOp, Bound, Comparison, Expression, PositiveTest, UnaryTests};
use super::lexer::{tokenize, Spanned, Token};
use super::value::FeelValue;
use super::FeelError;

const KEYWORDS: &[&str] = &["and", "or", "not", "true", "false", "null"];

/// Bound on both parenthesis nesting and syntax tree depth
pub const MAX_DEPTH: usize = 128;

/// Parse a single expression
pub fn parse_expression(source: &str) -> Result<Expression, FeelError> {
    if source.trim().is_empty() {
        return Ok(Expression::Literal(FeelValue::Null));
    }
    let mut parser = FeelParser::new(source)?;
    let expression = parser.expression()?;
    parser.expect_end()?;
    Ok(expression)
}

/// Parse comma-separated expressions, as found in `outputValues`
pub fn parse_expression_list(source: &str) -> Result<Vec<Expression>, FeelError> {
    if source.trim().is_empty() {
        return Ok(Vec::new());
    }
    let mut parser = FeelParser::new(source)?;
    let mut items = vec![parser.expression()?];
    while parser.eat(&Token::Comma) {
        items.push(parser.expression()?);
    }
    parser.expect_end()?;
    Ok(items)
}

/// Parse the unary tests of a decision table input entry
pub fn parse_unary_tests(source: &str) -> Result<UnaryTests, FeelError> {
    let mut parser = FeelParser::new(source)?;

    if parser.tokens.is_empty() || (parser.tokens.len() == 1 && parser.peek() == Some(&Token::Minus)) {
        return Ok(UnaryTests::Any);
    }

    if parser.is_word("not") && parser.peek_at(1) == Some(&Token::LParen) {
        parser.pos += 2;
        let tests = parser.positive_tests()?;
        parser.expect(&Token::RParen)?;
        parser.expect_end()?;
        return Ok(UnaryTests::Negated(tests));
    }

    let tests = parser.positive_tests()?;
    parser.expect_end()?;
    Ok(UnaryTests::Positive(tests))
}

struct FeelParser<'a> {
    source: &'a str,
    tokens: Vec<Spanned>,
    pos: usize,
    depth: usize,
}

impl<'a> FeelParser<'a> {
    fn new(source: &'a str) -> Result<Self, FeelError> {
        Ok(Self {
            source,
            tokens: tokenize(source)?,
            pos: 0,
            depth: 0,
        })
    }

    fn peek(&self) -> Option<&Token> {
        self.peek_at(0)
    }

    fn peek_at(&self, offset: usize) -> Option<&Token> {
        self.tokens.get(self.pos + offset).map(|s| &s.token)
    }

    fn advance(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).map(|s| s.token.clone());
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.peek() == Some(token) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn is_word(&self, word: &str) -> bool {
        matches!(self.peek(), Some(Token::Word(w)) if w == word)
    }

    fn position(&self) -> usize {
        self.tokens
            .get(self.pos)
            .map(|s| s.position)
            .unwrap_or(self.source.len())
    }

    fn error(&self, message: impl Into<String>) -> FeelError {
        FeelError::syntax(message, self.position(), self.source)
    }

    fn expect(&mut self, token: &Token) -> Result<(), FeelError> {
        if self.eat(token) {
            Ok(())
        } else {
            Err(self.error(format!("expected {:?}", token)))
        }
    }

    fn expect_end(&self) -> Result<(), FeelError> {
        match self.peek() {
            None => Ok(()),
            Some(token) => Err(self.error(format!("unexpected token {:?}", token))),
        }
    }

    /// Runs `parse` one nesting level deeper
    fn nested<T>(&mut self, parse: impl FnOnce(&mut Self) -> Result<T, FeelError>) -> Result<T, FeelError> {
        if self.depth >= MAX_DEPTH {
            return Err(self.error("expression nesting too deep"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Rejects a node whose tree would be deeper than [`MAX_DEPTH`]
    fn bounded(&self, expression: Expression) -> Result<Expression, FeelError> {
        if expression.depth() > MAX_DEPTH {
            return Err(self.error("expression nesting too deep"));
        }
        Ok(expression)
    }

    fn positive_tests(&mut self) -> Result<Vec<PositiveTest>, FeelError> {
        let mut tests = vec![self.positive_test()?];
        while self.eat(&Token::Comma) {
            tests.push(self.positive_test()?);
        }
        Ok(tests)
    }

    fn positive_test(&mut self) -> Result<PositiveTest, FeelError> {
        let comparison = match self.peek() {
            Some(Token::Lt) => Some(Comparison::Lt),
            Some(Token::Le) => Some(Comparison::Le),
            Some(Token::Gt) => Some(Comparison::Gt),
            Some(Token::Ge) => Some(Comparison::Ge),
            Some(Token::NotEq) => Some(Comparison::NotEq),
            _ => None,
        };
        if let Some(comparison) = comparison {
            self.pos += 1;
            return Ok(PositiveTest::Compare(comparison, self.additive()?));
        }

        match self.peek() {
            Some(Token::Eq) => {
                self.pos += 1;
                Ok(PositiveTest::Equal(self.additive()?))
            }
            Some(Token::LBracket) | Some(Token::RBracket) => self.interval(),
            Some(Token::LParen) => {
                // `(1..5)` is an interval, `(a + b)` is a parenthesized expression
                let saved = self.pos;
                self.pos += 1;
                let is_interval = self.additive().is_ok() && self.peek() == Some(&Token::Range);
                self.pos = saved;
                if is_interval {
                    self.interval()
                } else {
                    Ok(PositiveTest::Equal(self.expression()?))
                }
            }
            _ => Ok(PositiveTest::Equal(self.expression()?)),
        }
    }

    fn interval(&mut self) -> Result<PositiveTest, FeelError> {
        let low_inclusive = match self.advance() {
            Some(Token::LBracket) => true,
            Some(Token::RBracket) | Some(Token::LParen) => false,
            _ => return Err(self.error("expected interval start")),
        };
        let low = self.additive()?;
        self.expect(&Token::Range)?;
        let high = self.additive()?;
        let high_inclusive = match self.advance() {
            Some(Token::RBracket) => true,
            Some(Token::RParen) | Some(Token::LBracket) => false,
            _ => return Err(self.error("expected interval end")),
        };
        Ok(PositiveTest::Interval {
            low: Bound {
                value: low,
                inclusive: low_inclusive,
            },
            high: Bound {
                value: high,
                inclusive: high_inclusive,
            },
        })
    }

    fn expression(&mut self) -> Result<Expression, FeelError> {
        self.disjunction()
    }

    fn disjunction(&mut self) -> Result<Expression, FeelError> {
        let mut left = self.conjunction()?;
        while self.is_word("or") {
            self.pos += 1;
            let right = self.conjunction()?;
            left = self.bounded(Expression::binary(left, BinaryOp::Or, right))?;
        }
        Ok(left)
    }

    fn conjunction(&mut self) -> Result<Expression, FeelError> {
        let mut left = self.comparison()?;
        while self.is_word("and") {
            self.pos += 1;
            let right = self.comparison()?;
            left = self.bounded(Expression::binary(left, BinaryOp::And, right))?;
        }
        Ok(left)
    }

    fn comparison(&mut self) -> Result<Expression, FeelError> {
        let left = self.additive()?;
        let op = match self.peek() {
            Some(Token::Eq) => BinaryOp::Eq,
            Some(Token::NotEq) => BinaryOp::NotEq,
            Some(Token::Lt) => BinaryOp::Lt,
            Some(Token::Le) => BinaryOp::Le,
            Some(Token::Gt) => BinaryOp::Gt,
            Some(Token::Ge) => BinaryOp::Ge,
            _ => return Ok(left),
        };
        self.pos += 1;
        let right = self.additive()?;
        self.bounded(Expression::binary(left, op, right))
    }

    fn additive(&mut self) -> Result<Expression, FeelError> {
        let mut left = self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.multiplicative()?;
            left = self.bounded(Expression::binary(left, op, right))?;
        }
    }

    fn multiplicative(&mut self) -> Result<Expression, FeelError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(left),
            };
            self.pos += 1;
            let right = self.unary()?;
            left = self.bounded(Expression::binary(left, op, right))?;
        }
    }

    fn unary(&mut self) -> Result<Expression, FeelError> {
        if self.eat(&Token::Minus) {
            return match self.nested(Self::unary)? {
                Expression::Literal(FeelValue::Number(n)) => Ok(Expression::Literal(FeelValue::Number(-n))),
                operand => self.bounded(Expression::Negate(Box::new(operand))),
            };
        }
        self.postfix()
    }

    fn postfix(&mut self) -> Result<Expression, FeelError> {
        let mut base = self.primary()?;
        while self.eat(&Token::Dot) {
            let member = self.name()?;
            base = self.bounded(Expression::Path(Box::new(base), member))?;
        }
        Ok(base)
    }

    fn primary(&mut self) -> Result<Expression, FeelError> {
        match self.peek().cloned() {
            Some(Token::Number(n)) => {
                self.pos += 1;
                Ok(Expression::Literal(FeelValue::Number(n)))
            }
            Some(Token::String(s)) => {
                self.pos += 1;
                Ok(Expression::Literal(FeelValue::String(s)))
            }
            Some(Token::LParen) => {
                self.pos += 1;
                let inner = self.nested(Self::expression)?;
                self.expect(&Token::RParen)?;
                Ok(inner)
            }
            Some(Token::Word(word)) => match word.as_str() {
                "true" => {
                    self.pos += 1;
                    Ok(Expression::Literal(FeelValue::Bool(true)))
                }
                "false" => {
                    self.pos += 1;
                    Ok(Expression::Literal(FeelValue::Bool(false)))
                }
                "null" => {
                    self.pos += 1;
                    Ok(Expression::Literal(FeelValue::Null))
                }
                "not" if self.peek_at(1) == Some(&Token::LParen) => {
                    self.pos += 2;
                    let inner = self.nested(Self::expression)?;
                    self.expect(&Token::RParen)?;
                    self.bounded(Expression::Not(Box::new(inner)))
                }
                _ => Ok(Expression::Name(self.name()?)),
            },
            Some(token) => Err(self.error(format!("unexpected token {:?}", token))),
            None => Err(self.error("unexpected end of expression")),
        }
    }

    /// Consecutive non-keyword words form one name
    fn name(&mut self) -> Result<String, FeelError> {
        let mut words: Vec<String> = Vec::new();
        while let Some(Token::Word(word)) = self.peek() {
            if KEYWORDS.contains(&word.as_str()) && !words.is_empty() {
                break;
            }
            words.push(word.clone());
            self.pos += 1;
        }
        if words.is_empty() {
            return Err(self.error("expected a name"));
        }
        Ok(words.join(" "))
    }
}
