//! Lexer for literal expressions.
//!
//! Tokenizes the small expression language accepted by
//! [`LiteralEvaluator`](crate::LiteralEvaluator): numbers, quoted strings,
//! `True`/`False`/`None`, brackets, and arithmetic operators.
//!
//! # Examples
//!
//! ```
//! use hamlc_parser::expr_lexer::{ExprLexer, TokenKind};
//!
//! let tokens = ExprLexer::tokenize("{'id': 1}").unwrap();
//! assert_eq!(tokens[0].kind, TokenKind::LBrace);
//! assert_eq!(tokens[1].kind, TokenKind::String);
//! assert_eq!(tokens[2].kind, TokenKind::Colon);
//! assert_eq!(tokens[3].kind, TokenKind::Int);
//! ```

/// A character range in the expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// A token produced by the expression lexer.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    pub value: TokenValue,
}

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    // Literals
    Int,
    Float,
    String,
    True,
    False,
    None,

    Identifier,

    // Arithmetic
    Plus,
    Minus,
    Star,
    Slash,
    SlashSlash,
    Percent,

    // Delimiters
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,

    // Punctuation
    Comma,
    Colon,

    Eof,
}

/// The value carried by a token.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenValue {
    None,
    Int(i64),
    Float(f64),
    String(String),
    Identifier(String),
}

/// Expression lexer error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Expression lexer error at position {}: {message}", .span.start)]
pub struct ExprLexerError {
    pub message: String,
    pub span: Span,
}

pub struct ExprLexer {
    chars: Vec<char>,
    pos: usize,
}

impl ExprLexer {
    /// Tokenize the entire source, ending with an `Eof` token.
    pub fn tokenize(source: &str) -> Result<Vec<Token>, ExprLexerError> {
        let mut lexer = ExprLexer {
            chars: source.chars().collect(),
            pos: 0,
        };
        let mut tokens = Vec::new();

        while tokens.last().is_none_or(|token: &Token| token.kind != TokenKind::Eof) {
            tokens.push(lexer.next_token()?);
        }
        Ok(tokens)
    }

    fn next_token(&mut self) -> Result<Token, ExprLexerError> {
        self.skip_whitespace();

        let start = self.pos;
        let Some(ch) = self.current() else {
            return Ok(self.token(TokenKind::Eof, start, TokenValue::None));
        };

        let kind = match ch {
            '0'..='9' => return self.read_number(start),
            '.' if self.peek().is_some_and(|c| c.is_ascii_digit()) => {
                return self.read_number(start)
            }
            '\'' | '"' => return self.read_string(start),
            c if c.is_alphabetic() || c == '_' => return Ok(self.read_identifier(start)),

            '/' if self.peek() == Some('/') => {
                self.advance();
                TokenKind::SlashSlash
            }
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            ',' => TokenKind::Comma,
            ':' => TokenKind::Colon,

            _ => {
                return Err(ExprLexerError {
                    message: format!("Unexpected character: '{ch}'"),
                    span: Span::new(start, start + 1),
                })
            }
        };

        self.advance();
        Ok(self.token(kind, start, TokenValue::None))
    }

    fn read_number(&mut self, start: usize) -> Result<Token, ExprLexerError> {
        let mut is_float = false;

        self.skip_digits();
        if self.current() == Some('.') {
            is_float = true;
            self.advance();
            self.skip_digits();
        }
        if matches!(self.current(), Some('e' | 'E')) {
            let exponent_start = self.pos;
            self.advance();
            if matches!(self.current(), Some('+' | '-')) {
                self.advance();
            }
            if self.current().is_some_and(|c| c.is_ascii_digit()) {
                is_float = true;
                self.skip_digits();
            } else {
                self.pos = exponent_start;
            }
        }

        let text: String = self.chars[start..self.pos].iter().collect();
        let invalid = || ExprLexerError {
            message: format!("Invalid number: '{text}'"),
            span: Span::new(start, self.pos),
        };

        if is_float {
            let value: f64 = text.parse().map_err(|_| invalid())?;
            Ok(self.token(TokenKind::Float, start, TokenValue::Float(value)))
        } else {
            let value: i64 = text.parse().map_err(|_| invalid())?;
            Ok(self.token(TokenKind::Int, start, TokenValue::Int(value)))
        }
    }

    fn read_string(&mut self, start: usize) -> Result<Token, ExprLexerError> {
        let Some(quote) = self.current() else {
            return Err(self.unterminated(start));
        };
        self.advance(); // skip opening quote

        let mut value = String::new();

        loop {
            match self.current() {
                None => return Err(self.unterminated(start)),
                Some(c) if c == quote => break,
                Some('\\') => {
                    self.advance();
                    match self.current() {
                        None => return Err(self.unterminated(start)),
                        Some('n') => value.push('\n'),
                        Some('t') => value.push('\t'),
                        Some('r') => value.push('\r'),
                        Some('\\') => value.push('\\'),
                        Some(c) if c == '\'' || c == '"' => value.push(c),
                        Some(c) => {
                            value.push('\\');
                            value.push(c);
                        }
                    }
                }
                Some(c) => value.push(c),
            }
            self.advance();
        }

        self.advance(); // skip closing quote

        Ok(self.token(TokenKind::String, start, TokenValue::String(value)))
    }

    fn read_identifier(&mut self, start: usize) -> Token {
        while self
            .current()
            .is_some_and(|c| c.is_alphanumeric() || c == '_')
        {
            self.advance();
        }

        let text: String = self.chars[start..self.pos].iter().collect();

        match text.as_str() {
            "True" | "true" => self.token(TokenKind::True, start, TokenValue::None),
            "False" | "false" => self.token(TokenKind::False, start, TokenValue::None),
            "None" | "null" => self.token(TokenKind::None, start, TokenValue::None),
            _ => self.token(TokenKind::Identifier, start, TokenValue::Identifier(text)),
        }
    }

    fn unterminated(&self, start: usize) -> ExprLexerError {
        ExprLexerError {
            message: "Unterminated string".into(),
            span: Span::new(start, self.pos),
        }
    }

    fn token(&self, kind: TokenKind, start: usize, value: TokenValue) -> Token {
        Token {
            kind,
            span: Span::new(start, self.pos),
            value,
        }
    }

    fn current(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos + 1).copied()
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn skip_digits(&mut self) {
        while self.current().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.current().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }
}
