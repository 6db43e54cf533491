//! TUI pane rendering modules
//!
//! # Pane Modules
//!
//! - [`editor`]: the snippet with syntax highlighting and the edit cursor
//! - [`result`]: the mounted tree and the log panel
//! - [`status`]: status bar with keybindings and the outcome of the last pass
//!
//! Each pane module exports a primary `render_*` function taking the frame,
//! its area and the state it shows.

pub mod editor;
pub mod result;
pub mod status;

pub use editor::render_editor_pane;
pub use result::render_result_pane;
pub use status::render_status_bar;
