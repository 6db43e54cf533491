// Persistent mount target

use super::node::RenderNode;
use tracing::{debug, info};

/// Where built trees are mounted. Created once per playground, reused by
/// every pass and torn down with the playground.
#[derive(Debug)]
pub struct RenderRoot {
    anchor: String,
    content: Vec<RenderNode>,
    mounts: u64,
}

impl RenderRoot {
    pub fn new(anchor: impl Into<String>) -> Self {
        let anchor = anchor.into();
        info!(%anchor, "render root created");
        Self {
            anchor,
            content: Vec::new(),
            mounts: 0,
        }
    }

    pub fn anchor(&self) -> &str {
        &self.anchor
    }

    pub fn content(&self) -> &[RenderNode] {
        &self.content
    }

    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Number of trees mounted so far
    pub fn mounts(&self) -> u64 {
        self.mounts
    }

    /// Replace the whole content with `nodes`
    pub fn mount(&mut self, nodes: Vec<RenderNode>) {
        self.mounts += 1;
        debug!(anchor = %self.anchor, nodes = nodes.len(), mount = self.mounts, "tree mounted");
        self.content = nodes;
    }

    pub fn clear(&mut self) {
        if !self.content.is_empty() {
            debug!(anchor = %self.anchor, "render root cleared");
        }
        self.content.clear();
    }

    pub fn teardown(mut self) {
        self.content.clear();
        info!(anchor = %self.anchor, mounts = self.mounts, "render root torn down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mount_replaces_content() {
        let mut root = RenderRoot::new("anchor");
        root.mount(vec![RenderNode::text("one"), RenderNode::text("two")]);
        root.mount(vec![RenderNode::text("three")]);
        assert_eq!(root.content(), &[RenderNode::text("three")]);
        assert_eq!(root.mounts(), 2);

        root.clear();
        assert!(root.is_empty());
        assert_eq!(root.anchor(), "anchor");
    }
}
