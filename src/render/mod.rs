//! Render pipeline
//!
//! - [`node`]: host nodes, the mounted form of a UI tree
//! - [`tree`]: expansion of elements and components into host nodes
//! - [`guard`]: the failure-isolating supervisor around tree construction
//! - [`root`]: the persistent mount target
//! - [`pipeline`]: from execution result to committed view
//! - [`layout`]: terminal lines for a mounted tree

pub mod guard;
pub mod layout;
pub mod node;
pub mod pipeline;
pub mod root;
pub mod tree;

pub use guard::{GuardId, RenderGuard, TracingPanicHook};
pub use node::RenderNode;
pub use pipeline::{Outcome, RenderPipeline, ResultView};
pub use root::RenderRoot;
