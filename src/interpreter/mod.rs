//! Snippet interpreter
//!
//! This module evaluates lowered scripts:
//! - [`engine`]: the interpreter, its scopes, limits and ambient bindings
//! - [`errors`]: runtime error type and thrown error helpers
//! - [`builtins`]: language intrinsics (`Math`, `JSON`, `Object`, ...)
//! - [`constants`]: default limits
//!
//! # Execution Model
//!
//! The interpreter walks the lowered script one statement at a time. Each
//! statement, loop iteration and call consumes one step of a fixed budget, so
//! a runaway snippet ends with an error instead of hanging the host. The value
//! of the last top-level expression statement is the evaluation result.
//!
//! # Scopes
//!
//! Three scopes sit above a snippet's own globals: language intrinsics, then
//! the ambient bindings supplied by the host (`console`, `Markup`, ...). Both
//! are read-only to the snippet.

pub mod builtins;
pub mod constants;
pub mod engine;
pub mod errors;
mod expressions;
pub(crate) mod methods;
mod patterns;
mod statements;
