//! Main TUI application state and logic

use crate::playground::{Pass, Playground};
use crate::ui::editor::EditorBuffer;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;
use std::time::Duration;

/// Rows moved by PageUp/PageDown
const PAGE: usize = 10;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Editor,
    Result,
}

impl FocusedPane {
    pub fn toggle(self) -> Self {
        match self {
            FocusedPane::Editor => FocusedPane::Result,
            FocusedPane::Result => FocusedPane::Editor,
        }
    }
}

/// The main application state
pub struct App {
    pub playground: Playground,
    pub editor: EditorBuffer,

    /// Snippet restored by Ctrl-R
    pub initial_source: String,

    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub editor_scroll: usize,
    pub result_scroll: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Passes triggered since the last draw, committed in order before it
    pending: Vec<Pass>,
}

impl App {
    /// Create the app and run the first pass for `source`
    pub fn new(mut playground: Playground, source: String) -> Self {
        let view = playground.update(&source);
        let status_message = status_for(view.is_failure());
        App {
            playground,
            editor: EditorBuffer::new(&source),
            initial_source: source,
            focused_pane: FocusedPane::Editor,
            editor_scroll: 0,
            result_scroll: 0,
            should_quit: false,
            status_message,
            pending: Vec::new(),
        }
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            self.commit_pending();
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if event::poll(Duration::from_millis(250))? {
                // drain everything queued so one draw follows a burst of keys
                loop {
                    if let Event::Key(key) = event::read()? {
                        if key.kind == KeyEventKind::Press {
                            self.handle_key_event(key);
                        }
                    }
                    if self.should_quit || !event::poll(Duration::ZERO)? {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    /// Commit every pass triggered since the last draw; only the newest one
    /// is current, older ones are discarded by the playground
    pub fn commit_pending(&mut self) {
        let mut changed = false;
        for pass in self.pending.drain(..) {
            changed |= self.playground.commit(pass);
        }
        if changed {
            self.status_message = status_for(self.playground.view().is_failure());
        }
    }

    /// Render the UI
    pub fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        // Panes on top, status bar at the bottom
        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        // Editor on the left, result on the right
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        super::panes::render_editor_pane(
            frame,
            columns[0],
            &self.editor,
            self.focused_pane == FocusedPane::Editor,
            &mut self.editor_scroll,
        );

        super::panes::render_result_pane(
            frame,
            columns[1],
            self.playground.view(),
            &self.playground.config().anchor,
            self.focused_pane == FocusedPane::Result,
            &mut self.result_scroll,
        );

        super::panes::render_status_bar(
            frame,
            main_chunks[1],
            &self.status_message,
            self.playground.view(),
            self.playground.attempts(),
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('q') if ctrl => self.should_quit = true,
            KeyCode::Char('l') if ctrl => {
                self.focused_pane = self.focused_pane.toggle();
            }
            KeyCode::Char('r') if ctrl => {
                self.editor.set_text(&self.initial_source);
                self.editor_scroll = 0;
                self.source_changed();
                self.status_message = "Snippet restored".to_string();
            }
            _ => match self.focused_pane {
                FocusedPane::Editor => self.edit(key),
                FocusedPane::Result => self.scroll_result(key),
            },
        }
    }

    fn edit(&mut self, key: KeyEvent) {
        let changed = match key.code {
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.editor.insert_char(c);
                true
            }
            KeyCode::Enter => {
                self.editor.insert_newline();
                true
            }
            KeyCode::Tab => {
                self.editor.insert_tab();
                true
            }
            KeyCode::Backspace => self.editor.backspace(),
            KeyCode::Delete => self.editor.delete(),
            KeyCode::Left => {
                self.editor.move_left();
                false
            }
            KeyCode::Right => {
                self.editor.move_right();
                false
            }
            KeyCode::Up => {
                self.editor.move_up(1);
                false
            }
            KeyCode::Down => {
                self.editor.move_down(1);
                false
            }
            KeyCode::PageUp => {
                self.editor.move_up(PAGE);
                false
            }
            KeyCode::PageDown => {
                self.editor.move_down(PAGE);
                false
            }
            KeyCode::Home => {
                self.editor.move_home();
                false
            }
            KeyCode::End => {
                self.editor.move_end();
                false
            }
            _ => false,
        };
        if changed {
            self.source_changed();
        }
    }

    fn scroll_result(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Up => self.result_scroll = self.result_scroll.saturating_sub(1),
            KeyCode::Down => self.result_scroll = self.result_scroll.saturating_add(1),
            KeyCode::PageUp => self.result_scroll = self.result_scroll.saturating_sub(PAGE),
            KeyCode::PageDown => self.result_scroll = self.result_scroll.saturating_add(PAGE),
            KeyCode::Home => self.result_scroll = 0,
            _ => {}
        }
    }

    /// Every edit triggers an attempt right away
    fn source_changed(&mut self) {
        let pass = self.playground.set_source(&self.editor.text());
        self.pending.push(pass);
    }
}

fn status_for(failed: bool) -> String {
    if failed {
        "Snippet failed".to_string()
    } else {
        "Up to date".to_string()
    }
}
