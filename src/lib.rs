//! # Introduction
//!
//! live-snippet compiles markup-embedding snippets as they are edited,
//! evaluates them in a sandbox whose only window to the host is a handful of
//! ambient bindings, captures their console output, and renders either the
//! produced UI tree or a single failure entry. A broken snippet can never
//! take the host down.
//!
//! ## Execution pipeline
//!
//! ```text
//! Source → Transpiler → Interpreter → ExecutionResult → Render pipeline → (RenderRoot, Log panel)
//! ```
//!
//! 1. [`parser`]: tokenises the snippet and builds an AST, markup included.
//! 2. [`transpiler`]: strips imports and types, lowers markup to
//!    `Markup.createElement` calls, producing a [`transpiler::script::Script`].
//! 3. [`interpreter`] and [`memory`]: tree-walking evaluation with shared,
//!    reference-counted values and lexical scopes.
//! 4. [`execution`]: one attempt per source change; installs `console`,
//!    `Markup` and `useObserver`, converts every failure into data.
//! 5. [`render`]: builds host nodes inside a render guard and mounts them in
//!    the persistent render root; [`log_panel`] formats captured entries.
//! 6. [`playground`]: ties one snippet to one log store, engine and pipeline,
//!    and discards passes for stale source.
//! 7. [`ui`]: ratatui-based TUI; not part of the stable library API.
//!
//! ## Supported dialect
//!
//! Declarations, functions and arrows with destructuring, the usual control
//! flow with `try/catch/finally`, optional chaining, spread, template
//! literals and markup. Type annotations, interfaces and imports are erased.
//! Classes, async code, generators and regular expressions are rejected.

pub mod config;
pub mod console;
pub mod error;
pub mod execution;
pub mod interpreter;
pub mod log_panel;
pub mod memory;
pub mod parser;
pub mod playground;
pub mod render;
pub mod transpiler;
pub mod ui;
