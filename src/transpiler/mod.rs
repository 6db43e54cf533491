//! Transpiler adapter
//!
//! Turns snippet source into an executable [`Script`]:
//! - [`script`]: the lowered representation the interpreter runs
//! - `lower`: erasure of types and module syntax, markup to factory calls
//! - `emit`: `Display` for scripts
//!
//! The execution engine always uses [`TranspileOptions::default`]; the
//! options exist so the factory names are stated in one place.

mod emit;
mod lower;
pub mod script;

use crate::parser::ast::SourceLocation;
use crate::parser::{self, ParseError};
use script::Script;
use thiserror::Error;
use tracing::debug;

/// Markup factory used for every element
pub const MARKUP_FACTORY: &str = "Markup.createElement";
/// Element type used for `<>..</>`
pub const FRAGMENT_FACTORY: &str = "Markup.Fragment";

/// Fixed compile options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranspileOptions {
    pub markup_factory: String,
    pub fragment_factory: String,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            markup_factory: MARKUP_FACTORY.to_string(),
            fragment_factory: FRAGMENT_FACTORY.to_string(),
        }
    }
}

/// Malformed snippet
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("SyntaxError: {message} ({location})")]
pub struct CompileError {
    pub message: String,
    pub location: SourceLocation,
}

impl From<ParseError> for CompileError {
    fn from(err: ParseError) -> Self {
        CompileError {
            message: err.message,
            location: err.location,
        }
    }
}

/// Compile snippet source with the default options
pub fn transpile(source: &str) -> Result<Script, CompileError> {
    transpile_with(source, &TranspileOptions::default())
}

pub fn transpile_with(source: &str, options: &TranspileOptions) -> Result<Script, CompileError> {
    let program = parser::parse_program(source)?;
    let script = lower::Lowerer::new(options).lower_program(program);
    if !script.stripped_imports.is_empty() {
        debug!(imports = ?script.stripped_imports, "stripped import declarations");
    }
    Ok(script)
}
