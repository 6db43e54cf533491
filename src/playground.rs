//! Playground instance
//!
//! One playground owns one snippet, one log store, one execution engine and
//! one render pipeline. Every source change triggers an attempt, producing a
//! [`Pass`] tagged with the source it ran on; committing the pass renders it
//! unless a newer source has arrived in the meantime.

use crate::config::PlaygroundConfig;
use crate::console::{LogEntry, LogStore};
use crate::execution::{AttemptState, ExecutionEngine, ExecutionResult};
use crate::render::{RenderPipeline, RenderRoot, ResultView};
use std::rc::Rc;
use tracing::{debug, info};

/// Identifies the source text a pass was triggered for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassTag {
    pub serial: u64,
    pub source: Rc<str>,
}

/// An executed attempt waiting to be rendered
#[derive(Debug)]
pub struct Pass {
    tag: PassTag,
    result: ExecutionResult,
}

impl Pass {
    pub fn tag(&self) -> &PassTag {
        &self.tag
    }

    pub fn result(&self) -> &ExecutionResult {
        &self.result
    }
}

pub struct Playground {
    config: PlaygroundConfig,
    source: Rc<str>,
    logs: LogStore,
    engine: ExecutionEngine,
    pipeline: RenderPipeline,
    serial: u64,
    view: ResultView,
    committed: Option<PassTag>,
}

impl Playground {
    pub fn new(config: PlaygroundConfig) -> Self {
        let logs = LogStore::new();
        let engine = ExecutionEngine::new(config.limits(), logs.clone());
        let pipeline = RenderPipeline::new(config.anchor.clone(), config.keep_logs_on_failure);
        Self {
            config,
            source: Rc::from(""),
            logs,
            engine,
            pipeline,
            serial: 0,
            view: ResultView::empty(),
            committed: None,
        }
    }

    /// Create a playground and run its first pass, as on first mount
    pub fn with_source(config: PlaygroundConfig, source: &str) -> Self {
        let mut playground = Self::new(config);
        playground.update(source);
        playground
    }

    pub fn config(&self) -> &PlaygroundConfig {
        &self.config
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Change the source and run an attempt for it. The returned pass still
    /// has to be committed.
    pub fn set_source(&mut self, source: &str) -> Pass {
        self.source = Rc::from(source);
        self.trigger()
    }

    /// Run an attempt for the current source
    pub fn trigger(&mut self) -> Pass {
        self.serial += 1;
        let tag = PassTag {
            serial: self.serial,
            source: Rc::clone(&self.source),
        };
        debug!(serial = tag.serial, bytes = tag.source.len(), "attempt triggered");
        let result = self.engine.execute(&tag.source);
        Pass { tag, result }
    }

    pub fn is_current(&self, tag: &PassTag) -> bool {
        tag.serial == self.serial && tag.source == self.source
    }

    /// Render `pass` unless it is stale. Returns whether the view changed.
    pub fn commit(&mut self, pass: Pass) -> bool {
        if !self.is_current(&pass.tag) {
            debug!(serial = pass.tag.serial, latest = self.serial, "stale pass discarded");
            return false;
        }
        self.view = self.pipeline.render(pass.result, &self.logs);
        self.view.observers = self.engine.observers().len();
        info!(
            serial = pass.tag.serial,
            outcome = ?self.view.outcome,
            logs = self.view.logs.len(),
            observers = self.view.observers,
            "pass committed"
        );
        self.committed = Some(pass.tag);
        true
    }

    /// Change the source, run and commit in one step
    pub fn update(&mut self, source: &str) -> &ResultView {
        let pass = self.set_source(source);
        self.commit(pass);
        &self.view
    }

    /// Re-run the current source
    pub fn rerun(&mut self) -> &ResultView {
        let pass = self.trigger();
        self.commit(pass);
        &self.view
    }

    /// The last committed view
    pub fn view(&self) -> &ResultView {
        &self.view
    }

    /// Tag of the last committed pass
    pub fn committed(&self) -> Option<&PassTag> {
        self.committed.as_ref()
    }

    /// Entries of the current attempt, whether or not they are shown
    pub fn logs(&self) -> Vec<LogEntry> {
        self.logs.entries()
    }

    pub fn log_store(&self) -> &LogStore {
        &self.logs
    }

    pub fn root(&self) -> Option<&RenderRoot> {
        self.pipeline.root()
    }

    pub fn roots_created(&self) -> u32 {
        self.pipeline.roots_created()
    }

    pub fn attempt_state(&self) -> AttemptState {
        self.engine.state()
    }

    pub fn attempts(&self) -> u64 {
        self.engine.attempts()
    }
}

impl Drop for Playground {
    fn drop(&mut self) {
        self.pipeline.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::Outcome;

    #[test]
    fn test_stale_pass_is_discarded() {
        let mut playground = Playground::new(PlaygroundConfig::default());
        let first = playground.set_source("<p>first</p>");
        let second = playground.set_source("<p>second</p>");

        assert!(!playground.commit(first));
        assert_eq!(playground.view(), &ResultView::empty());

        assert!(playground.commit(second));
        assert_eq!(playground.view().mounted[0].text_content(), "second");
    }

    #[test]
    fn test_update_replaces_error_display() {
        let mut playground = Playground::new(PlaygroundConfig::default());
        assert!(playground.update("throw new Error('boom')").is_failure());

        let view = playground.update("<b>ok</b>");
        assert_eq!(view.outcome, Outcome::Rendered);
        assert!(!view.shows_log_panel());
    }

    #[test]
    fn test_rerun_is_idempotent() {
        let mut playground = Playground::with_source(
            PlaygroundConfig::default(),
            "console.info(Math.random()); <p>{[1, 2].map(n => n * 2).join()}</p>",
        );
        let first = playground.view().clone();
        let second = playground.rerun().clone();
        assert_eq!(first.mounted, second.mounted);
        assert_eq!(first.logs, second.logs);
        assert_ne!(first.guard, second.guard);
    }

    #[test]
    fn test_view_counts_observed_state() {
        let mut playground = Playground::new(PlaygroundConfig::default());
        let view = playground.update("const a = useObserver({ n: 1 }); const b = useObserver(2); <p>{a.n + b.value}</p>");
        assert_eq!(view.observers, 2);
        assert_eq!(view.mounted[0].text_content(), "3");

        assert_eq!(playground.update("<p>plain</p>").observers, 0);
    }
}
