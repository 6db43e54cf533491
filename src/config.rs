// Playground configuration

use crate::interpreter::constants::{
    DEFAULT_ANCHOR, DEFAULT_MAX_CALL_DEPTH, DEFAULT_RANDOM_SEED, DEFAULT_STEP_LIMIT,
};
use crate::interpreter::engine::Limits;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaygroundConfig {
    /// Steps one attempt may execute before it fails
    pub step_limit: u64,
    pub max_call_depth: usize,
    /// Seed `Math.random` restarts from on every attempt
    pub random_seed: u64,
    /// Name of the render root's mount point
    pub anchor: String,
    /// Show entries logged before a failure above the synthesized error
    pub keep_logs_on_failure: bool,
}

impl PlaygroundConfig {
    pub fn limits(&self) -> Limits {
        Limits {
            step_limit: self.step_limit,
            max_call_depth: self.max_call_depth,
            random_seed: self.random_seed,
        }
    }
}

impl Default for PlaygroundConfig {
    fn default() -> Self {
        Self {
            step_limit: DEFAULT_STEP_LIMIT,
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            random_seed: DEFAULT_RANDOM_SEED,
            anchor: DEFAULT_ANCHOR.to_string(),
            keep_logs_on_failure: false,
        }
    }
}
