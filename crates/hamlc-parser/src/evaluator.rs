//! The expression evaluation capability.
//!
//! The compiler never evaluates expressions itself. Whatever evaluates the
//! `{...}` attribute mappings is passed in by the caller; failures are
//! propagated unchanged.

use crate::value::Value;

/// Evaluation error.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Evaluation error in `{expression}`: {message}")]
pub struct EvalError {
    pub message: String,
    pub expression: String,
}

impl EvalError {
    pub fn new(message: impl Into<String>, expression: &str) -> Self {
        Self {
            message: message.into(),
            expression: expression.to_string(),
        }
    }
}

/// Evaluates an expression string to a [`Value`].
pub trait Evaluator {
    fn evaluate(&self, expression: &str) -> Result<Value, EvalError>;
}

impl<F> Evaluator for F
where
    F: Fn(&str) -> Result<Value, EvalError>,
{
    fn evaluate(&self, expression: &str) -> Result<Value, EvalError> {
        self(expression)
    }
}
