//! Snippet source parser
//!
//! This module transforms snippet text into an Abstract Syntax Tree (AST):
//! - [`lexer`]: Tokenization (source text → tokens), plus raw markup text
//! - [`parse`]: Parsing (tokens → AST), split across `impl Parser` files
//! - [`ast`]: AST node definitions
//!
//! # Supported dialect
//!
//! A statically-typed scripting dialect with embedded markup:
//! - `let`/`const`/`var` with destructuring, functions and arrow functions
//! - Control flow: `if`, `while`, `do-while`, `for`, `for-of`, `for-in`,
//!   `try`/`catch`/`finally`, `throw`
//! - Type annotations, `interface`, `type`, `as`, `satisfies` and `!`, which
//!   are parsed and then erased
//! - `import`/`export` at the top level, which are erased as well
//! - Markup elements: `<tag attr={value}>text {expr}</tag>`, fragments `<>..</>`
//! - No classes, async functions, generators, regular expressions, labels
//!   or `switch`
//!
//! # Parser Implementation
//!
//! Hand-written recursive descent parser pulling tokens lazily, so that
//! markup text can be scanned raw between tags.

pub mod ast;
mod declarations;
mod expressions;
pub mod lexer;
mod markup;
pub mod parse;
mod statements;
mod types;

pub use parse::{ParseError, Parser};

/// Parse a complete snippet
pub fn parse_program(source: &str) -> Result<ast::Program, ParseError> {
    Parser::new(source)?.parse_program()
}
