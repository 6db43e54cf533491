// Drives the TUI against an in-memory terminal

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use live_snippet::config::PlaygroundConfig;
use live_snippet::playground::Playground;
use live_snippet::render::Outcome;
use live_snippet::ui::app::FocusedPane;
use live_snippet::ui::App;
use ratatui::{backend::TestBackend, Terminal};

fn app(source: &str) -> App {
    App::new(Playground::new(PlaygroundConfig::default()), source.to_string())
}

fn screen(app: &mut App) -> String {
    let mut terminal = Terminal::new(TestBackend::new(100, 30)).unwrap();
    terminal.draw(|frame| app.render(frame)).unwrap();
    terminal
        .backend()
        .buffer()
        .content
        .iter()
        .map(|cell| cell.symbol())
        .collect()
}

fn key(code: KeyCode) -> KeyEvent {
    KeyEvent::new(code, KeyModifiers::NONE)
}

fn ctrl(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::CONTROL)
}

#[test]
fn test_initial_render_shows_mounted_tree() {
    let mut app = app("<p>hello tui</p>");
    let text = screen(&mut app);
    assert!(text.contains("hello tui"));
    assert!(text.contains("RENDERED"));
    assert!(!text.contains("LOG OUTPUT"));
}

#[test]
fn test_failure_shows_log_panel() {
    let mut app = app("throw new Error('boom')");
    let text = screen(&mut app);
    assert!(text.contains("LOG OUTPUT"));
    assert!(text.contains("Error: boom"));
    assert!(text.contains("ERROR"));
}

#[test]
fn test_typing_triggers_a_new_pass() {
    let mut app = app("1");
    assert_eq!(app.playground.view().outcome, Outcome::NonRenderable);

    app.editor.move_end();
    for c in " +".chars() {
        app.handle_key_event(key(KeyCode::Char(c)));
    }
    // "1 +" does not compile; only the last pending pass is current
    app.commit_pending();
    assert!(app.playground.view().is_failure());

    app.handle_key_event(key(KeyCode::Char('1')));
    app.commit_pending();
    assert_eq!(app.editor.text(), "1 +1");
    assert_eq!(app.playground.view().value.as_ref().map(|v| v.to_plain_text()), Some("2".to_string()));
}

#[test]
fn test_reset_restores_initial_source() {
    let mut app = app("<b>start</b>");
    app.handle_key_event(key(KeyCode::Backspace));
    app.handle_key_event(key(KeyCode::Char('x')));
    app.commit_pending();
    assert_ne!(app.editor.text(), "<b>start</b>");

    app.handle_key_event(ctrl('r'));
    app.commit_pending();
    assert_eq!(app.editor.text(), "<b>start</b>");
    assert_eq!(app.playground.view().outcome, Outcome::Rendered);
}

#[test]
fn test_focus_toggle_and_quit() {
    let mut app = app("<p>x</p>");
    assert_eq!(app.focused_pane, FocusedPane::Editor);
    app.handle_key_event(ctrl('l'));
    assert_eq!(app.focused_pane, FocusedPane::Result);

    // arrows scroll the result pane instead of editing
    app.handle_key_event(key(KeyCode::Down));
    assert_eq!(app.result_scroll, 1);
    assert_eq!(app.editor.text(), "<p>x</p>");

    app.handle_key_event(key(KeyCode::Esc));
    assert!(app.should_quit);
}

#[test]
fn test_status_bar_counts_observed_state() {
    let mut app = app("const s = useObserver({ n: 4 }); <p>{s.n}</p>");
    let text = screen(&mut app);
    assert!(text.contains("observed 1"));

    let mut plain = crate::app("<p>none</p>");
    assert!(!screen(&mut plain).contains("observed"));
}

#[test]
fn test_very_long_line_renders() {
    let long = format!("'{}'", "x".repeat(70_000));
    let mut app = app(&long);
    app.editor.move_end();
    assert_eq!(app.editor.cursor(), (0, 70_002));
    let text = screen(&mut app);
    assert!(text.contains("VALUE"));
}
