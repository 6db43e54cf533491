//! Memory model for the snippet interpreter
//!
//! This module provides the core runtime abstractions:
//! - [`value`]: Runtime value representation (primitives, shared arrays and
//!   objects, closures, native functions, elements, errors)
//! - [`scope`]: Lexical scopes with `let`/`const` bindings and `this`
//! - [`json`]: Conversion between values and JSON for the `JSON` intrinsic
//!
//! # Sharing
//!
//! Arrays, objects and functions are `Rc` handles. Copying a value copies the
//! handle, so two bindings can observe the same mutation:
//! ```text
//! const a = [1]; const b = a; b.push(2);   // a is [1, 2]
//! ```
//!
//! Nothing here is `Send`: one playground owns its values on one thread.

pub mod json;
pub mod scope;
pub mod value;
