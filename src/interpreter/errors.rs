//! Runtime error types for the snippet interpreter
//!
//! This module defines [`RuntimeError`], which represents everything that can
//! stop evaluation (as opposed to compile errors raised before a script runs).
//!
//! Script-level errors are values: `throw x` and interpreter failures such as
//! reading a property of `undefined` both become [`RuntimeError::Thrown`] and
//! can be caught by `try/catch`. Exhausting the step budget cannot be caught.

use crate::memory::value::Value;
use thiserror::Error;

/// Runtime errors that can occur during evaluation
#[derive(Debug, Clone, Error)]
pub enum RuntimeError {
    /// A value thrown by the script or by the interpreter on its behalf
    #[error("{}", .0.to_display_string())]
    Thrown(Value),

    /// The attempt ran out of steps
    #[error("RangeError: Execution step limit of {limit} exceeded")]
    StepLimitExceeded { limit: u64 },
}

impl RuntimeError {
    /// Throw a new error value with the given constructor name
    pub fn throw(name: &str, message: impl Into<String>) -> Self {
        RuntimeError::Thrown(Value::error(name, message))
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::throw("TypeError", message)
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::throw("RangeError", message)
    }

    pub fn reference_error(message: impl Into<String>) -> Self {
        Self::throw("ReferenceError", message)
    }

    pub fn syntax_error(message: impl Into<String>) -> Self {
        Self::throw("SyntaxError", message)
    }

    /// Whether `catch` may intercept this error
    pub fn is_catchable(&self) -> bool {
        matches!(self, RuntimeError::Thrown(_))
    }

    /// The value a failure display reports
    pub fn thrown_value(&self) -> Value {
        match self {
            RuntimeError::Thrown(value) => value.clone(),
            RuntimeError::StepLimitExceeded { limit } => Value::error(
                "RangeError",
                format!("Execution step limit of {} exceeded", limit),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(RuntimeError::type_error("x is not a function").to_string(), "TypeError: x is not a function");
        assert_eq!(RuntimeError::Thrown(Value::string("plain")).to_string(), "plain");
        assert_eq!(
            RuntimeError::StepLimitExceeded { limit: 10 }.to_string(),
            "RangeError: Execution step limit of 10 exceeded"
        );
    }

    #[test]
    fn test_step_limit_is_not_catchable() {
        assert!(RuntimeError::range_error("x").is_catchable());
        assert!(!RuntimeError::StepLimitExceeded { limit: 1 }.is_catchable());
    }
}
