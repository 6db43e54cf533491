//! Playground error taxonomy
//!
//! Every failure of an attempt ends up as one of three errors, each caught
//! where it originates and turned into a single synthesized log entry. None
//! of them reaches the embedding host as anything but data.

use crate::console::{LogEntry, LogKind, LogValue};
use crate::interpreter::errors::RuntimeError;
use crate::transpiler::CompileError;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Where an attempt failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Compile,
    Evaluate,
    Render,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Compile => "compile",
            Stage::Evaluate => "evaluate",
            Stage::Render => "render",
        })
    }
}

/// Error raised while the compiled script ran
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{thrown}")]
pub struct EvaluationError {
    pub thrown: LogValue,
}

impl From<RuntimeError> for EvaluationError {
    fn from(err: RuntimeError) -> Self {
        Self {
            thrown: LogValue::capture(&err.thrown_value()),
        }
    }
}

/// Error raised while the produced UI tree was being built
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{thrown}")]
pub struct RenderError {
    pub thrown: LogValue,
}

impl RenderError {
    pub fn new(name: &str, message: impl Into<String>) -> Self {
        Self {
            thrown: LogValue::error(name, message),
        }
    }
}

impl From<RuntimeError> for RenderError {
    fn from(err: RuntimeError) -> Self {
        Self {
            thrown: LogValue::capture(&err.thrown_value()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaygroundError {
    #[error(transparent)]
    Compile(#[from] CompileError),
    #[error(transparent)]
    Evaluation(#[from] EvaluationError),
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl PlaygroundError {
    pub fn stage(&self) -> Stage {
        match self {
            PlaygroundError::Compile(_) => Stage::Compile,
            PlaygroundError::Evaluation(_) => Stage::Evaluate,
            PlaygroundError::Render(_) => Stage::Render,
        }
    }

    /// The value shown for this error in the log panel
    pub fn thrown(&self) -> LogValue {
        match self {
            PlaygroundError::Compile(err) => {
                LogValue::error("SyntaxError", format!("{} ({})", err.message, err.location))
            }
            PlaygroundError::Evaluation(err) => err.thrown.clone(),
            PlaygroundError::Render(err) => err.thrown.clone(),
        }
    }

    /// The single Error entry that replaces the log on failure
    pub fn log_entry(&self) -> LogEntry {
        LogEntry::new(LogKind::Error, vec![self.thrown()])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transpiler::transpile;

    #[test]
    fn test_compile_error_entry() {
        let err = PlaygroundError::from(transpile("let = 1").unwrap_err());
        assert_eq!(err.stage(), Stage::Compile);
        let entry = err.log_entry();
        assert_eq!(entry.kind, LogKind::Error);
        assert!(entry.text().starts_with("SyntaxError: "));
        assert_eq!(entry.text(), err.to_string());
    }

    #[test]
    fn test_thrown_error_entry() {
        let err = PlaygroundError::from(EvaluationError::from(RuntimeError::type_error("x is not a function")));
        assert_eq!(err.stage(), Stage::Evaluate);
        assert_eq!(err.log_entry().text(), "TypeError: x is not a function");
    }

    #[test]
    fn test_step_limit_is_reported_as_range_error() {
        let err = EvaluationError::from(RuntimeError::StepLimitExceeded { limit: 10 });
        assert_eq!(err.to_string(), "RangeError: Execution step limit of 10 exceeded");
    }
}
