//! Element line grammar.
//!
//! One element line has the fixed shape
//!
//! ```text
//! %tag#id.class.class(attr=value ...) or {'attr': value}  < > / =  content
//! ```
//!
//! where every part is optional. This module only splits the line; the
//! `{...}` mapping is kept as text and evaluated at render time.

/// Element line grammar error. `column` is 1-based within the trimmed line.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (column {column})")]
pub struct GrammarError {
    pub message: String,
    pub column: usize,
}

/// A parsed element line.
#[derive(Debug, Clone, PartialEq)]
pub struct ElementLine {
    pub tag: String,
    /// Id written with `#`, empty when absent.
    pub id: String,
    /// Classes written with `.`, in source order.
    pub classes: Vec<String>,
    pub attributes: Attributes,
    /// `<`: strip whitespace inside the element.
    pub inner_strip: bool,
    /// `>`: strip whitespace around the element.
    pub outer_strip: bool,
    /// `/`: render as a self-closing tag.
    pub self_closing: bool,
    /// `=`: the content is an expression.
    pub evaluate: bool,
    pub content: String,
}

/// The attribute clause of an element line.
#[derive(Debug, Clone, PartialEq)]
pub enum Attributes {
    None,
    /// `(key=value key2="value")`, in source order.
    List(Vec<(String, AttrValue)>),
    /// `{...}`, including the braces, for the evaluator.
    Mapping(String),
}

/// A value from a parenthesized attribute list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrValue {
    /// A quoted value with its quotes removed.
    Literal(String),
    /// An unquoted all-digit value.
    Number(String),
    /// Any other unquoted value.
    Expression(String),
}

impl ElementLine {
    pub fn parse(text: &str) -> Result<Self, GrammarError> {
        LineScanner::new(text).element()
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | ':')
}

struct LineScanner {
    chars: Vec<char>,
    pos: usize,
}

impl LineScanner {
    fn new(text: &str) -> Self {
        Self {
            chars: text.trim().chars().collect(),
            pos: 0,
        }
    }

    fn element(mut self) -> Result<ElementLine, GrammarError> {
        let tag = if self.eat('%') {
            let tag = self.name();
            if tag.is_empty() {
                return Err(self.error("Expected a tag name after '%'"));
            }
            tag
        } else {
            "div".to_string()
        };

        let id = if self.eat('#') {
            self.name()
        } else {
            String::new()
        };

        let mut classes = Vec::new();
        while self.eat('.') {
            let class = self.name();
            if !class.is_empty() {
                classes.push(class);
            }
        }

        let attributes = match self.peek() {
            Some('(') => {
                let group = self.group('(', ')')?;
                let inner = &group[1..group.len() - 1];
                Attributes::List(attribute_list(inner).map_err(|message| GrammarError {
                    message,
                    column: self.pos,
                })?)
            }
            Some('{') => Attributes::Mapping(self.group('{', '}')?),
            _ => Attributes::None,
        };

        let inner_strip = self.eat('<');
        let outer_strip = self.eat('>');
        let self_closing = self.eat('/');
        let evaluate = self.eat('=');

        let content: String = self.chars[self.pos..].iter().collect();

        Ok(ElementLine {
            tag,
            id,
            classes,
            attributes,
            inner_strip,
            outer_strip,
            self_closing,
            evaluate,
            content: content.trim().to_string(),
        })
    }

    /// Read a tag, id, or class name.
    fn name(&mut self) -> String {
        let start = self.pos;
        while self.peek().is_some_and(is_name_char) {
            self.pos += 1;
        }
        self.chars[start..self.pos].iter().collect()
    }

    /// Read a bracketed group, quote-aware, including both brackets.
    fn group(&mut self, open: char, close: char) -> Result<String, GrammarError> {
        let start = self.pos;
        let mut depth = 0usize;
        let mut quote: Option<char> = None;

        while let Some(c) = self.peek() {
            self.pos += 1;
            match quote {
                Some(q) => {
                    if c == '\\' {
                        self.pos += 1;
                    } else if c == q {
                        quote = None;
                    }
                }
                None if c == '"' || c == '\'' => quote = Some(c),
                None if c == open => depth += 1,
                None if c == close => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(self.chars[start..self.pos].iter().collect());
                    }
                }
                None => {}
            }
        }

        self.pos = start;
        Err(self.error(&format!("Unbalanced '{open}' in attributes")))
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn error(&self, message: &str) -> GrammarError {
        GrammarError {
            message: message.to_string(),
            column: self.pos + 1,
        }
    }
}

/// Parse the inside of a `(...)` attribute list.
///
/// `key=value` starts an attribute. A bare token following an unquoted value
/// continues that value, so `(class=a if b else c)` keeps the whole
/// expression. Any other bare token is a boolean attribute.
fn attribute_list(inner: &str) -> Result<Vec<(String, AttrValue)>, String> {
    let mut pairs: Vec<(String, Option<String>)> = Vec::new();

    for token in split_tokens(inner)? {
        match token.split_once('=') {
            Some((key, value)) if !key.is_empty() && !key.contains(['"', '\'']) => {
                pairs.push((key.to_string(), Some(value.to_string())));
            }
            _ => match pairs.last_mut() {
                Some((_, Some(value))) if !value.is_empty() && !is_quoted(value) => {
                    value.push(' ');
                    value.push_str(&token);
                }
                _ => pairs.push((token, None)),
            },
        }
    }

    Ok(pairs
        .into_iter()
        .filter_map(|(key, value)| match value {
            None => Some((key.clone(), AttrValue::Literal(key))),
            Some(value) if value.is_empty() => None,
            Some(value) => Some((key, classify_value(value))),
        })
        .collect())
}

fn classify_value(value: String) -> AttrValue {
    if is_quoted(&value) {
        AttrValue::Literal(value[1..value.len() - 1].to_string())
    } else if value.chars().all(|c| c.is_ascii_digit()) {
        AttrValue::Number(value)
    } else {
        AttrValue::Expression(value)
    }
}

fn is_quoted(value: &str) -> bool {
    let mut chars = value.chars();
    match (chars.next(), chars.next_back()) {
        (Some(first), Some(last)) => (first == '"' || first == '\'') && first == last,
        _ => false,
    }
}

/// Split on whitespace outside quotes.
fn split_tokens(inner: &str) -> Result<Vec<String>, String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut quote: Option<char> = None;

    for c in inner.chars() {
        match quote {
            Some(q) => {
                current.push(c);
                if c == q {
                    quote = None;
                }
            }
            None if c.is_whitespace() => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            None => {
                if c == '"' || c == '\'' {
                    quote = Some(c);
                }
                current.push(c);
            }
        }
    }

    if let Some(q) = quote {
        return Err(format!("Unterminated {q} in attribute list"));
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    Ok(tokens)
}
