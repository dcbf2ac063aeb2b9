//! Default evaluator for attribute mappings.
//!
//! Evaluates literal data structures with a little arithmetic, enough for
//! `{'class': ['a', 'b'], 'data-n': 1+1}`. There are no variables: any name
//! other than `True`, `False` and `None` is an error.

use crate::evaluator::{EvalError, Evaluator};
use crate::expr_lexer::{ExprLexer, Token, TokenKind, TokenValue};
use crate::value::Value;

/// Longest string a `*` repetition may build, in bytes.
const MAX_REPEAT_LEN: usize = 1 << 20;

/// Evaluates literal expressions.
///
/// ```text
/// expression := term (('+' | '-') term)*
/// term       := unary (('*' | '/' | '//' | '%') unary)*
/// unary      := ('-' | '+') unary | primary
/// primary    := number | string+ | True | False | None
///             | '(' [expression (',' expression)* [',']] ')'
///             | '[' [expression (',' expression)* [',']] ']'
///             | '{' [expression ':' expression (',' ...)* [',']] '}'
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralEvaluator;

impl Evaluator for LiteralEvaluator {
    fn evaluate(&self, expression: &str) -> Result<Value, EvalError> {
        let tokens = ExprLexer::tokenize(expression)
            .map_err(|e| EvalError::new(e.to_string(), expression))?;
        let mut parser = LiteralParser {
            tokens,
            pos: 0,
            source: expression,
        };
        let value = parser.expression()?;
        if parser.peek() != TokenKind::Eof {
            return Err(parser.unexpected());
        }
        Ok(value)
    }
}

struct LiteralParser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    source: &'a str,
}

impl LiteralParser<'_> {
    fn expression(&mut self) -> Result<Value, EvalError> {
        let mut left = self.term()?;
        loop {
            let op = match self.peek() {
                TokenKind::Plus => BinaryOp::Add,
                TokenKind::Minus => BinaryOp::Sub,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.term()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn term(&mut self) -> Result<Value, EvalError> {
        let mut left = self.unary()?;
        loop {
            let op = match self.peek() {
                TokenKind::Star => BinaryOp::Mul,
                TokenKind::Slash => BinaryOp::Div,
                TokenKind::SlashSlash => BinaryOp::FloorDiv,
                TokenKind::Percent => BinaryOp::Mod,
                _ => return Ok(left),
            };
            self.advance();
            let right = self.unary()?;
            left = self.binary(op, left, right)?;
        }
    }

    fn unary(&mut self) -> Result<Value, EvalError> {
        match self.peek() {
            TokenKind::Minus => {
                self.advance();
                let operand = self.unary()?;
                match number(&operand) {
                    Some(Number::Int(n)) => n
                        .checked_neg()
                        .map(Value::Int)
                        .ok_or_else(|| self.error("integer overflow")),
                    Some(Number::Float(f)) => Ok(Value::Float(-f)),
                    None => Err(self.error(format!(
                        "bad operand type for unary -: '{}'",
                        operand.type_name()
                    ))),
                }
            }
            TokenKind::Plus => {
                self.advance();
                let operand = self.unary()?;
                match number(&operand) {
                    Some(Number::Int(n)) => Ok(Value::Int(n)),
                    Some(Number::Float(f)) => Ok(Value::Float(f)),
                    None => Err(self.error(format!(
                        "bad operand type for unary +: '{}'",
                        operand.type_name()
                    ))),
                }
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Value, EvalError> {
        let token = self.tokens[self.pos].clone();
        match (token.kind, token.value) {
            (TokenKind::Int, TokenValue::Int(n)) => {
                self.advance();
                Ok(Value::Int(n))
            }
            (TokenKind::Float, TokenValue::Float(f)) => {
                self.advance();
                Ok(Value::Float(f))
            }
            (TokenKind::String, TokenValue::String(s)) => {
                self.advance();
                // Adjacent string literals concatenate.
                let mut s = s;
                while let TokenValue::String(next) = &self.tokens[self.pos].value {
                    s.push_str(next);
                    self.advance();
                }
                Ok(Value::Str(s))
            }
            (TokenKind::True, _) => {
                self.advance();
                Ok(Value::Bool(true))
            }
            (TokenKind::False, _) => {
                self.advance();
                Ok(Value::Bool(false))
            }
            (TokenKind::None, _) => {
                self.advance();
                Ok(Value::None)
            }
            (TokenKind::Identifier, TokenValue::Identifier(name)) => {
                Err(self.error(format!("name '{name}' is not defined")))
            }
            (TokenKind::LParen, _) => {
                self.advance();
                let (mut items, trailing_comma) = self.sequence(TokenKind::RParen)?;
                if items.len() == 1 && !trailing_comma {
                    Ok(items.remove(0))
                } else {
                    Ok(Value::List(items))
                }
            }
            (TokenKind::LBracket, _) => {
                self.advance();
                let (items, _) = self.sequence(TokenKind::RBracket)?;
                Ok(Value::List(items))
            }
            (TokenKind::LBrace, _) => {
                self.advance();
                self.mapping()
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Comma-separated expressions up to `close`. The opening bracket has
    /// been consumed. Also reports whether a trailing comma was present.
    fn sequence(&mut self, close: TokenKind) -> Result<(Vec<Value>, bool), EvalError> {
        let mut items = Vec::new();
        let mut trailing_comma = false;

        while self.peek() != close {
            items.push(self.expression()?);
            trailing_comma = self.peek() == TokenKind::Comma;
            if trailing_comma {
                self.advance();
            } else if self.peek() != close {
                return Err(self.unexpected());
            }
        }

        self.advance();
        Ok((items, trailing_comma))
    }

    fn mapping(&mut self) -> Result<Value, EvalError> {
        let mut entries = Vec::new();

        while self.peek() != TokenKind::RBrace {
            let key = self.expression()?;
            if matches!(key, Value::List(_) | Value::Map(_)) {
                return Err(self.error(format!("unhashable type: '{}'", key.type_name())));
            }
            self.expect(TokenKind::Colon)?;
            let value = self.expression()?;
            Value::insert(&mut entries, key, value);

            if self.peek() == TokenKind::Comma {
                self.advance();
            } else if self.peek() != TokenKind::RBrace {
                return Err(self.unexpected());
            }
        }

        self.advance();
        Ok(Value::Map(entries))
    }

    fn binary(&self, op: BinaryOp, left: Value, right: Value) -> Result<Value, EvalError> {
        let overflow = || self.error("integer overflow");

        match (op, &left, &right) {
            (BinaryOp::Add, Value::Str(a), Value::Str(b)) => return Ok(Value::Str(format!("{a}{b}"))),
            (BinaryOp::Add, Value::List(a), Value::List(b)) => {
                return Ok(Value::List(a.iter().chain(b).cloned().collect()))
            }
            (BinaryOp::Mul, Value::Str(s), Value::Int(n))
            | (BinaryOp::Mul, Value::Int(n), Value::Str(s)) => {
                let count = usize::try_from(*n).unwrap_or(0);
                return match s.len().checked_mul(count) {
                    Some(len) if len <= MAX_REPEAT_LEN => Ok(Value::Str(s.repeat(count))),
                    _ => Err(self.error("repeated string is too long")),
                };
            }
            _ => {}
        }

        let (Some(a), Some(b)) = (number(&left), number(&right)) else {
            return Err(self.error(format!(
                "unsupported operand types for {}: '{}' and '{}'",
                op.symbol(),
                left.type_name(),
                right.type_name()
            )));
        };

        match (a, b) {
            (Number::Int(a), Number::Int(b)) => match op {
                BinaryOp::Add => a.checked_add(b).map(Value::Int).ok_or_else(overflow),
                BinaryOp::Sub => a.checked_sub(b).map(Value::Int).ok_or_else(overflow),
                BinaryOp::Mul => a.checked_mul(b).map(Value::Int).ok_or_else(overflow),
                BinaryOp::Div => {
                    if b == 0 {
                        return Err(self.error("division by zero"));
                    }
                    Ok(Value::Float(a as f64 / b as f64))
                }
                BinaryOp::FloorDiv | BinaryOp::Mod => {
                    if b == 0 {
                        return Err(self.error("integer division or modulo by zero"));
                    }
                    let quotient = a.checked_div(b).ok_or_else(overflow)?;
                    let remainder = a.checked_rem(b).ok_or_else(overflow)?;
                    // Floor toward negative infinity; the remainder takes the divisor's sign.
                    let adjust = remainder != 0 && (remainder < 0) != (b < 0);
                    if op == BinaryOp::FloorDiv {
                        Ok(Value::Int(if adjust { quotient - 1 } else { quotient }))
                    } else {
                        Ok(Value::Int(if adjust { remainder + b } else { remainder }))
                    }
                }
            },
            (a, b) => {
                let (a, b) = (a.as_f64(), b.as_f64());
                match op {
                    BinaryOp::Add => Ok(Value::Float(a + b)),
                    BinaryOp::Sub => Ok(Value::Float(a - b)),
                    BinaryOp::Mul => Ok(Value::Float(a * b)),
                    _ if b == 0.0 => Err(self.error("float division by zero")),
                    BinaryOp::Div => Ok(Value::Float(a / b)),
                    BinaryOp::FloorDiv => Ok(Value::Float((a / b).floor())),
                    BinaryOp::Mod => {
                        let r = a % b;
                        Ok(Value::Float(if r != 0.0 && (r < 0.0) != (b < 0.0) { r + b } else { r }))
                    }
                }
            }
        }
    }

    // --- Helpers ---

    fn peek(&self) -> TokenKind {
        self.tokens[self.pos].kind
    }

    fn advance(&mut self) {
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Result<(), EvalError> {
        if self.peek() == kind {
            self.advance();
            Ok(())
        } else {
            Err(self.unexpected())
        }
    }

    fn unexpected(&self) -> EvalError {
        let token = &self.tokens[self.pos];
        if token.kind == TokenKind::Eof {
            self.error("unexpected end of expression")
        } else {
            self.error(format!(
                "invalid syntax at position {}",
                token.span.start
            ))
        }
    }

    fn error(&self, message: impl Into<String>) -> EvalError {
        EvalError::new(message, self.source)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    FloorDiv,
    Mod,
}

impl BinaryOp {
    fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::FloorDiv => "//",
            BinaryOp::Mod => "%",
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::Int(n) => n as f64,
            Number::Float(f) => f,
        }
    }
}

/// Numeric view of a value; booleans count as 0 and 1.
fn number(value: &Value) -> Option<Number> {
    match value {
        Value::Bool(b) => Some(Number::Int(i64::from(*b))),
        Value::Int(n) => Some(Number::Int(*n)),
        Value::Float(f) => Some(Number::Float(*f)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn eval(source: &str) -> Value {
        LiteralEvaluator.evaluate(source).unwrap()
    }

    fn eval_err(source: &str) -> String {
        LiteralEvaluator.evaluate(source).unwrap_err().message
    }

    fn s(text: &str) -> Value {
        Value::from(text)
    }

    // =========================================================================
    // Literals
    // =========================================================================

    #[test]
    fn test_scalars() {
        assert_eq!(eval("1"), Value::Int(1));
        assert_eq!(eval("2.5"), Value::Float(2.5));
        assert_eq!(eval("'a'"), s("a"));
        assert_eq!(eval("True"), Value::Bool(true));
        assert_eq!(eval("False"), Value::Bool(false));
        assert_eq!(eval("None"), Value::None);
    }

    #[test]
    fn test_adjacent_strings() {
        assert_eq!(eval("'a' \"b\" 'c'"), s("abc"));
    }

    #[test]
    fn test_list_and_tuple() {
        assert_eq!(eval("['a', 'b']"), Value::List(vec![s("a"), s("b")]));
        assert_eq!(eval("('a', 'b')"), Value::List(vec![s("a"), s("b")]));
        assert_eq!(eval("('a',)"), Value::List(vec![s("a")]));
        assert_eq!(eval("()"), Value::List(vec![]));
        assert_eq!(eval("[1, 2,]"), Value::List(vec![Value::Int(1), Value::Int(2)]));
    }

    #[test]
    fn test_nested_lists() {
        assert_eq!(
            eval("[['a', 'b'], ['c']]"),
            Value::List(vec![
                Value::List(vec![s("a"), s("b")]),
                Value::List(vec![s("c")]),
            ])
        );
    }

    #[test]
    fn test_mapping_order_and_duplicates() {
        assert_eq!(
            eval("{'style': 'ugly', 'id': 1, 'style': 'nice'}"),
            Value::Map(vec![(s("style"), s("nice")), (s("id"), Value::Int(1))])
        );
    }

    #[test]
    fn test_mapping_computed_key() {
        assert_eq!(
            eval("{(1+1): 1+1}"),
            Value::Map(vec![(Value::Int(2), Value::Int(2))])
        );
    }

    #[test]
    fn test_mapping_none_key() {
        assert_eq!(eval("{None: None}"), Value::Map(vec![(Value::None, Value::None)]));
    }

    #[test]
    fn test_empty_mapping() {
        assert_eq!(eval("{}"), Value::Map(vec![]));
    }

    // =========================================================================
    // Arithmetic
    // =========================================================================

    #[test]
    fn test_int_arithmetic() {
        assert_eq!(eval("1+2"), Value::Int(3));
        assert_eq!(eval("2 * 3 + 4"), Value::Int(10));
        assert_eq!(eval("2 * (3 + 4)"), Value::Int(14));
        assert_eq!(eval("-3 - -1"), Value::Int(-2));
    }

    #[test]
    fn test_division() {
        assert_eq!(eval("7 / 2"), Value::Float(3.5));
        assert_eq!(eval("7 // 2"), Value::Int(3));
        assert_eq!(eval("-7 // 2"), Value::Int(-4));
        assert_eq!(eval("-7 % 3"), Value::Int(2));
        assert_eq!(eval("7 % -3"), Value::Int(-2));
    }

    #[test]
    fn test_float_promotion() {
        assert_eq!(eval("1 + 0.5"), Value::Float(1.5));
        assert_eq!(eval("True + 1"), Value::Int(2));
    }

    #[test]
    fn test_string_and_list_operations() {
        assert_eq!(eval("'http://' + 'haml-lang.com'"), s("http://haml-lang.com"));
        assert_eq!(eval("'ab' * 2"), s("abab"));
        assert_eq!(
            eval("['a'] + ['b']"),
            Value::List(vec![s("a"), s("b")])
        );
    }

    // =========================================================================
    // Errors
    // =========================================================================

    #[test]
    fn test_undefined_name() {
        assert_eq!(eval_err("user"), "name 'user' is not defined");
    }

    #[test]
    fn test_division_by_zero() {
        assert_eq!(eval_err("1 / 0"), "division by zero");
        assert_eq!(eval_err("1 % 0"), "integer division or modulo by zero");
        assert_eq!(eval_err("1.0 // 0"), "float division by zero");
    }

    #[test]
    fn test_overflow() {
        assert_eq!(eval_err("9223372036854775807 + 1"), "integer overflow");
    }

    #[test]
    fn test_string_repeat_bounded() {
        assert_eq!(eval("'ab' * 3"), Value::from("ababab"));
        assert_eq!(eval("2 * 'ab'"), Value::from("abab"));
        assert_eq!(eval("'ab' * -1"), Value::from(""));
        assert_eq!(eval_err("'ab' * 9223372036854775807"), "repeated string is too long");
        assert_eq!(eval_err("'a' * 2000000"), "repeated string is too long");
    }

    #[test]
    fn test_type_error() {
        assert_eq!(
            eval_err("'a' + 1"),
            "unsupported operand types for +: 'str' and 'int'"
        );
        assert_eq!(eval_err("-'a'"), "bad operand type for unary -: 'str'");
    }

    #[test]
    fn test_unhashable_key() {
        assert_eq!(eval_err("{['a']: 1}"), "unhashable type: 'list'");
    }

    #[test]
    fn test_syntax_errors() {
        assert_eq!(eval_err("{'a' 1}"), "invalid syntax at position 5");
        assert_eq!(eval_err("[1, 2"), "unexpected end of expression");
        assert_eq!(eval_err("1 2"), "invalid syntax at position 2");
    }

    #[test]
    fn test_lexer_error_carries_expression() {
        let err = LiteralEvaluator.evaluate("1 & 2").unwrap_err();
        assert_eq!(err.expression, "1 & 2");
        assert!(err.message.contains("Unexpected character"));
    }
}
