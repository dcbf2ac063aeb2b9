//! hamlc Parser
//!
//! Builds the node tree of a template from the lexer's block tree.
//! Each block is classified by its leading marker and becomes one [`Node`];
//! element lines are parsed by the line grammar in [`element`].
//!
//! Also home to the [`Evaluator`] capability used to evaluate `{...}`
//! attribute mappings, and [`LiteralEvaluator`], the default implementation.

pub mod ast;
pub mod element;
pub mod evaluator;
pub mod expr_lexer;
pub mod literal;
pub mod markers;
pub mod parser;
pub mod value;

pub use ast::{Code, Comment, Document, Filter, FilterKind, Node, NodeKind, Siblings, Text};
pub use element::{AttrValue, Attributes, ElementLine};
pub use evaluator::{EvalError, Evaluator};
pub use literal::LiteralEvaluator;
pub use parser::Parser;
pub use value::Value;

/// Parser error with position information.
///
/// `depth` is the nesting level of the offending line (0 for top level).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Parse error at line {line} (depth {depth}): {message}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub depth: usize,
}
