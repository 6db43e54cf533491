// End-to-end tests: source in, mounted tree and log panel out

use live_snippet::config::PlaygroundConfig;
use live_snippet::console::{LogKind, LogStore, LogValue};
use live_snippet::error::Stage;
use live_snippet::execution::{ExecutionEngine, ExecutionResult};
use live_snippet::interpreter::engine::Limits;
use live_snippet::log_panel::panel_text;
use live_snippet::playground::Playground;
use live_snippet::render::layout::{layout, plain_text};
use live_snippet::render::Outcome;
use std::fs;
use std::path::Path;

fn demo(name: &str) -> String {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join(name);
    fs::read_to_string(&path).unwrap_or_else(|e| panic!("cannot read {}: {}", path.display(), e))
}

fn playground() -> Playground {
    Playground::new(PlaygroundConfig::default())
}

#[test]
fn test_value_without_logs_shows_nothing() {
    let mut playground = playground();
    let view = playground.update("1+1");
    assert_eq!(view.outcome, Outcome::NonRenderable);
    assert_eq!(view.value, Some(LogValue::Number(2.0)));
    assert!(view.mounted.is_empty());
    assert!(!view.shows_log_panel());
}

#[test]
fn test_single_info_entry() {
    let mut playground = playground();
    let view = playground.update("console.info('hi')");
    assert_eq!(view.outcome, Outcome::NonRenderable);
    assert!(view.mounted.is_empty());
    assert_eq!(view.logs.len(), 1);
    assert_eq!(view.logs[0].kind, LogKind::Info);
    assert_eq!(view.logs[0].arguments, vec![LogValue::string("hi")]);
}

#[test]
fn test_thrown_error_is_single_error_entry() {
    let mut playground = playground();
    let view = playground.update("throw new Error('boom')");
    assert_eq!(view.outcome, Outcome::Failed);
    assert_eq!(view.failed_stage, Some(Stage::Evaluate));
    assert_eq!(view.logs.len(), 1);
    assert_eq!(view.logs[0].kind, LogKind::Error);
    assert_eq!(view.logs[0].text(), "Error: boom");
}

#[test]
fn test_error_without_message_keeps_separator() {
    let mut playground = playground();
    let view = playground.update("throw new Error()");
    assert_eq!(view.logs.len(), 1);
    assert_eq!(view.logs[0].text(), "Error: ");

    let view = playground.update("console.error(new RangeError(''))");
    assert_eq!(view.logs[0].text(), "RangeError: ");
}

#[test]
fn test_fix_replaces_error_display() {
    let mut playground = playground();
    assert!(playground.update("throw new Error('boom')").is_failure());

    let view = playground.update("<p>fixed</p>");
    assert_eq!(view.outcome, Outcome::Rendered);
    assert!(view.logs.is_empty());
    assert_eq!(view.mounted.len(), 1);
    assert_eq!(view.mounted[0].text_content(), "fixed");
}

#[test]
fn test_renderable_without_logs_mounts_node() {
    let mut playground = playground();
    let view = playground.update("<ul><li>a</li><li>b</li></ul>");
    assert_eq!(view.outcome, Outcome::Rendered);
    assert!(!view.shows_log_panel());
    let list = &view.mounted[0];
    assert_eq!(list.tag(), Some("ul"));
    assert_eq!(list.children().len(), 2);
    assert_eq!(list.text_content(), "ab");
}

#[test]
fn test_log_entries_in_call_order() {
    let mut playground = playground();
    let source = r#"
        for (let i = 0; i < 3; i++) {
            console.log('step', i);
        }
        console.warn('careful');
        console.error('bad');
        console.debug('quiet');
    "#;
    let view = playground.update(source);
    let kinds: Vec<LogKind> = view.logs.iter().map(|entry| entry.kind).collect();
    assert_eq!(
        kinds,
        vec![
            LogKind::Info,
            LogKind::Info,
            LogKind::Info,
            LogKind::Warning,
            LogKind::Error,
            LogKind::Info,
        ]
    );
    assert_eq!(view.logs[2].text(), "step\n2");
}

#[test]
fn test_compile_error_leaves_root_empty() {
    let mut playground = playground();
    playground.update("<p>before</p>");
    assert!(playground.root().is_some_and(|root| !root.is_empty()));

    let view = playground.update("const = ;");
    assert_eq!(view.outcome, Outcome::Failed);
    assert_eq!(view.failed_stage, Some(Stage::Compile));
    assert_eq!(view.logs.len(), 1);
    assert!(view.logs[0].text().starts_with("SyntaxError: "));
    assert!(playground.root().is_some_and(|root| root.is_empty()));
}

#[test]
fn test_component_failure_then_recovery() {
    let mut playground = playground();
    let failing = r#"
        const Broken = () => { throw new TypeError('no data'); };
        <div><Broken /></div>
    "#;
    let view = playground.update(failing).clone();
    assert_eq!(view.outcome, Outcome::Failed);
    assert_eq!(view.failed_stage, Some(Stage::Render));
    assert_eq!(view.logs[0].text(), "TypeError: no data");
    assert!(playground.root().map_or(true, |root| root.is_empty()));

    let recovered = playground.update("const Fixed = () => <span>ok</span>; <div><Fixed /></div>");
    assert_eq!(recovered.outcome, Outcome::Rendered);
    assert_eq!(recovered.mounted[0].text_content(), "ok");
    assert_ne!(recovered.guard, view.guard);
    assert_eq!(playground.roots_created(), 1);
}

#[test]
fn test_runaway_loop_fails_instead_of_hanging() {
    let config = PlaygroundConfig {
        step_limit: 10_000,
        ..PlaygroundConfig::default()
    };
    let mut playground = Playground::new(config);
    let view = playground.update("while (true) {}");
    assert_eq!(view.outcome, Outcome::Failed);
    assert!(view.logs[0].text().starts_with("RangeError"));
}

#[test]
fn test_keep_logs_on_failure() {
    let config = PlaygroundConfig {
        keep_logs_on_failure: true,
        ..PlaygroundConfig::default()
    };
    let mut playground = Playground::new(config);
    let view = playground.update(&demo("broken.tsx"));
    assert_eq!(view.logs.len(), 2);
    assert_eq!(view.logs[0].kind, LogKind::Info);
    assert_eq!(view.logs[1].text(), "RangeError: division by zero");
}

#[test]
fn test_broken_demo_drops_earlier_logs_by_default() {
    let mut playground = playground();
    let view = playground.update(&demo("broken.tsx"));
    assert_eq!(view.logs.len(), 1);
    assert_eq!(view.logs[0].text(), "RangeError: division by zero");
}

#[test]
fn test_counter_demo() {
    let mut playground = playground();
    let view = playground.update(&demo("counter.tsx"));
    assert_eq!(view.outcome, Outcome::Rendered, "logs: {:?}", view.logs);

    let root = &view.mounted[0];
    assert_eq!(root.find("h1").map(|n| n.text_content()), Some("live-snippet".to_string()));
    let list = root.find("ol").expect("list rendered");
    assert_eq!(list.children().len(), 4);
    assert_eq!(root.find("code").map(|n| n.text_content()), Some("6".to_string()));
    assert_eq!(root.find("b").and_then(|n| n.attribute("color")), Some("green"));

    assert_eq!(view.logs.len(), 1);
    assert_eq!(view.logs[0].text(), "rendering\n4\nstages");

    let text = plain_text(&layout(&view.mounted));
    assert!(text.contains("live-snippet"));
    assert!(text.contains("[ Increment ]"));
}

#[test]
fn test_logs_demo() {
    let mut playground = playground();
    let view = playground.update(&demo("logs.tsx"));
    assert_eq!(view.outcome, Outcome::Rendered);
    assert_eq!(view.logs.len(), 3);
    assert_eq!(view.logs[1].kind, LogKind::Warning);
    assert!(view.logs[1].arguments[1].is_structured());
    assert_eq!(view.logs[2].text(), "TypeError: not fatal");

    let panel = panel_text(&view.logs);
    assert!(panel.starts_with("LOG OUTPUT"));
    assert!(panel.contains("\"name\": \"Ada\""));
}

#[test]
fn test_value_demo() {
    let mut playground = playground();
    let view = playground.update(&demo("value.tsx"));
    assert_eq!(view.outcome, Outcome::NonRenderable);
    assert_eq!(view.value, Some(LogValue::Number(14.0)));
    assert_eq!(view.logs.len(), 1);
}

#[test]
fn test_rerun_is_idempotent() {
    let mut playground = Playground::with_source(PlaygroundConfig::default(), &demo("counter.tsx"));
    let first = playground.view().clone();
    let second = playground.rerun().clone();
    assert_eq!(first.mounted, second.mounted);
    assert_eq!(first.logs, second.logs);
    assert_eq!(playground.attempts(), 2);
}

#[test]
fn test_only_ambient_names_leak_into_snippet() {
    let mut engine = ExecutionEngine::new(Limits::default(), LogStore::new());
    let result = engine.execute("[typeof process, typeof require, typeof console, typeof useObserver].join()");
    match result {
        ExecutionResult::NonRenderable(value) => {
            assert_eq!(value, LogValue::string("undefined,undefined,object,function"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}
