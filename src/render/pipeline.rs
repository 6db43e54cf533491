//! Render pipeline
//!
//! Turns an [`ExecutionResult`] into a committed [`ResultView`]: mounts
//! rendered trees through a fresh [`RenderGuard`], clears the root for
//! everything else, and picks the log entries the log panel shows.

use super::guard::{GuardId, RenderGuard};
use super::node::RenderNode;
use super::root::RenderRoot;
use super::tree::build_tree;
use crate::console::{LogEntry, LogStore, LogValue};
use crate::error::{PlaygroundError, Stage};
use crate::execution::ExecutionResult;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Rendered,
    NonRenderable,
    Failed,
}

/// What a committed pass shows: the mounted tree and the log panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResultView {
    pub outcome: Outcome,
    /// Snapshot of the render root after the pass
    pub mounted: Vec<RenderNode>,
    /// Entries for the log panel; empty means no panel
    pub logs: Vec<LogEntry>,
    /// Completion value of a non-renderable result
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<LogValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failed_stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub guard: Option<GuardId>,
    /// State containers handed out by `useObserver` during the attempt
    pub observers: usize,
}

impl ResultView {
    /// View before the first pass
    pub fn empty() -> Self {
        Self {
            outcome: Outcome::NonRenderable,
            mounted: Vec::new(),
            logs: Vec::new(),
            value: None,
            failed_stage: None,
            guard: None,
            observers: 0,
        }
    }

    pub fn shows_log_panel(&self) -> bool {
        !self.logs.is_empty()
    }

    pub fn is_failure(&self) -> bool {
        self.outcome == Outcome::Failed
    }
}

impl Default for ResultView {
    fn default() -> Self {
        Self::empty()
    }
}

pub struct RenderPipeline {
    anchor: String,
    root: Option<RenderRoot>,
    roots_created: u32,
    next_guard: u64,
    keep_logs_on_failure: bool,
}

impl RenderPipeline {
    pub fn new(anchor: impl Into<String>, keep_logs_on_failure: bool) -> Self {
        Self {
            anchor: anchor.into(),
            root: None,
            roots_created: 0,
            next_guard: 0,
            keep_logs_on_failure,
        }
    }

    /// The render root, if any pass has needed one yet
    pub fn root(&self) -> Option<&RenderRoot> {
        self.root.as_ref()
    }

    pub fn roots_created(&self) -> u32 {
        self.roots_created
    }

    fn root_mut(&mut self) -> &mut RenderRoot {
        let anchor = &self.anchor;
        let roots_created = &mut self.roots_created;
        self.root.get_or_insert_with(|| {
            *roots_created += 1;
            RenderRoot::new(anchor.clone())
        })
    }

    fn clear_root(&mut self) {
        if let Some(root) = self.root.as_mut() {
            root.clear();
        }
    }

    fn mounted(&self) -> Vec<RenderNode> {
        self.root.as_ref().map(|root| root.content().to_vec()).unwrap_or_default()
    }

    /// Render one execution result; `logs` is read after the tree is built
    /// so entries logged by components are included
    pub fn render(&mut self, result: ExecutionResult, logs: &LogStore) -> ResultView {
        match result {
            ExecutionResult::Rendered(mut output) => {
                self.next_guard += 1;
                let id = GuardId(self.next_guard);
                let built = RenderGuard::new(id).run(|| {
                    let (element, interpreter) = output.parts();
                    build_tree(interpreter, element)
                });
                match built {
                    Ok(nodes) => {
                        self.root_mut().mount(nodes);
                        ResultView {
                            outcome: Outcome::Rendered,
                            mounted: self.mounted(),
                            logs: logs.entries(),
                            value: None,
                            failed_stage: None,
                            guard: Some(id),
                            observers: 0,
                        }
                    }
                    Err(err) => {
                        let mut view = self.failure(PlaygroundError::Render(err), logs);
                        view.guard = Some(id);
                        view
                    }
                }
            }
            ExecutionResult::NonRenderable(value) => {
                self.clear_root();
                ResultView {
                    outcome: Outcome::NonRenderable,
                    mounted: Vec::new(),
                    logs: logs.entries(),
                    value: Some(value),
                    failed_stage: None,
                    guard: None,
                    observers: 0,
                }
            }
            ExecutionResult::Failure(err) => self.failure(err, logs),
        }
    }

    fn failure(&mut self, err: PlaygroundError, logs: &LogStore) -> ResultView {
        self.clear_root();
        debug!(stage = %err.stage(), error = %err, "showing failure");
        let mut entries = if self.keep_logs_on_failure {
            logs.entries()
        } else {
            Vec::new()
        };
        entries.push(err.log_entry());
        ResultView {
            outcome: Outcome::Failed,
            mounted: Vec::new(),
            logs: entries,
            value: None,
            failed_stage: Some(err.stage()),
            guard: None,
            observers: 0,
        }
    }

    /// Drop the render root; the next pass would create a new one
    pub fn teardown(&mut self) {
        if let Some(root) = self.root.take() {
            root.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::LogKind;
    use crate::execution::ExecutionEngine;
    use crate::interpreter::engine::Limits;

    fn pass(pipeline: &mut RenderPipeline, engine: &mut ExecutionEngine, source: &str) -> ResultView {
        let result = engine.execute(source);
        let logs = engine.logs().clone();
        pipeline.render(result, &logs)
    }

    fn setup(keep_logs: bool) -> (RenderPipeline, ExecutionEngine) {
        (
            RenderPipeline::new("root", keep_logs),
            ExecutionEngine::new(Limits::default(), LogStore::new()),
        )
    }

    #[test]
    fn test_root_is_created_lazily_and_reused() {
        let (mut pipeline, mut engine) = setup(false);
        pass(&mut pipeline, &mut engine, "1");
        assert!(pipeline.root().is_none());

        pass(&mut pipeline, &mut engine, "<p>a</p>");
        pass(&mut pipeline, &mut engine, "<p>b</p>");
        assert_eq!(pipeline.roots_created(), 1);
        assert_eq!(pipeline.root().map(RenderRoot::mounts), Some(2));
    }

    #[test]
    fn test_failure_clears_root_and_replaces_logs() {
        let (mut pipeline, mut engine) = setup(false);
        pass(&mut pipeline, &mut engine, "<p>ok</p>");
        let view = pass(&mut pipeline, &mut engine, "console.info('before'); throw new Error('boom')");
        assert!(view.is_failure());
        assert!(view.mounted.is_empty());
        assert_eq!(pipeline.root().map(RenderRoot::is_empty), Some(true));
        assert_eq!(view.logs.len(), 1);
        assert_eq!(view.logs[0].kind, LogKind::Error);
        assert_eq!(view.logs[0].text(), "Error: boom");
    }

    #[test]
    fn test_keep_logs_on_failure() {
        let (mut pipeline, mut engine) = setup(true);
        let view = pass(&mut pipeline, &mut engine, "console.info('before'); throw new Error('boom')");
        let texts: Vec<String> = view.logs.iter().map(LogEntry::text).collect();
        assert_eq!(texts, vec!["before", "Error: boom"]);
    }

    #[test]
    fn test_render_failure_uses_fresh_guard() {
        let (mut pipeline, mut engine) = setup(false);
        let failed = pass(&mut pipeline, &mut engine, "const Bad = () => { throw new Error('bad') }; <Bad />");
        assert_eq!(failed.failed_stage, Some(Stage::Render));
        assert_eq!(failed.logs[0].text(), "Error: bad");

        let ok = pass(&mut pipeline, &mut engine, "<p>fine</p>");
        assert_eq!(ok.outcome, Outcome::Rendered);
        assert!(ok.logs.is_empty());
        assert_ne!(ok.guard, failed.guard);
    }

    #[test]
    fn test_component_logs_reach_the_panel() {
        let (mut pipeline, mut engine) = setup(false);
        let view = pass(&mut pipeline, &mut engine, "const C = () => { console.warn('rendering'); return <i>x</i> }; <C />");
        assert_eq!(view.outcome, Outcome::Rendered);
        assert_eq!(view.logs.len(), 1);
        assert_eq!(view.logs[0].kind, LogKind::Warning);
    }
}
