// Defaults for the snippet interpreter

/// Statements, loop iterations and calls one attempt may execute
pub const DEFAULT_STEP_LIMIT: u64 = 1_000_000;

/// Nested calls before `RangeError: Maximum call stack size exceeded`
pub const DEFAULT_MAX_CALL_DEPTH: usize = 128;

/// Seed for `Math.random`; every attempt starts from it
pub const DEFAULT_RANDOM_SEED: u64 = 0x5EED_CAFE;

/// Anchor name of the render root
pub const DEFAULT_ANCHOR: &str = "live-snippet-root";

/// Dead scope handles tolerated before the teardown list is pruned
pub const SCOPE_PRUNE_THRESHOLD: usize = 4096;

/// Longest array or string a snippet may build
pub const MAX_COLLECTION_LENGTH: usize = 1 << 24;

/// Nesting of elements and child arrays a render pass may expand
pub const MAX_RENDER_DEPTH: usize = 256;
