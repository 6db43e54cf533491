//! Log panel
//!
//! Pure presentation of captured log entries, oldest first. Each entry is one
//! block of lines tagged with an icon for its kind; arguments are formatted
//! by [`LogValue`](crate::console::LogValue)'s `Display` and joined with
//! newlines.

use crate::console::{LogEntry, LogKind};
use ratatui::buffer::Buffer;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Widget, Wrap};

pub const PANEL_TITLE: &str = "LOG OUTPUT";

pub fn icon(kind: LogKind) -> &'static str {
    match kind {
        LogKind::Info => "ⓘ",
        LogKind::Warning => "⚠",
        LogKind::Error => "✖",
    }
}

/// Foreground and background treatment per kind
pub fn kind_style(kind: LogKind) -> Style {
    match kind {
        LogKind::Info => Style::default().fg(Color::Blue),
        LogKind::Warning => Style::default().fg(Color::Yellow).bg(Color::Rgb(58, 50, 20)),
        LogKind::Error => Style::default().fg(Color::Red).bg(Color::Rgb(60, 24, 30)),
    }
}

/// Styled lines for all entries
pub fn panel_lines(entries: &[LogEntry]) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    for entry in entries {
        let style = kind_style(entry.kind);
        let text = entry.text();
        for (index, part) in text.split('\n').enumerate() {
            let prefix = if index == 0 {
                format!("{} ", icon(entry.kind))
            } else {
                "  ".to_string()
            };
            lines.push(Line::from(vec![
                Span::styled(prefix, style.add_modifier(Modifier::BOLD)),
                Span::styled(part.to_string(), style),
            ]));
        }
    }
    lines
}

/// Plain text form, used by the headless output
pub fn panel_text(entries: &[LogEntry]) -> String {
    let mut out = format!("{}\n", PANEL_TITLE);
    for line in panel_lines(entries) {
        for span in &line.spans {
            out.push_str(&span.content);
        }
        out.push('\n');
    }
    out
}

/// Bordered widget over a slice of entries
pub struct LogPanel<'a> {
    entries: &'a [LogEntry],
    scroll: u16,
}

impl<'a> LogPanel<'a> {
    pub fn new(entries: &'a [LogEntry]) -> Self {
        Self { entries, scroll: 0 }
    }

    pub fn scroll(mut self, scroll: u16) -> Self {
        self.scroll = scroll;
        self
    }

    /// Rows needed to show every entry below the title
    pub fn height(&self) -> u16 {
        let lines: usize = self.entries.iter().map(|entry| entry.text().split('\n').count()).sum();
        (lines as u16).saturating_add(1)
    }
}

impl Widget for LogPanel<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(format!(" {} ", PANEL_TITLE))
            .borders(Borders::TOP);
        Paragraph::new(panel_lines(self.entries))
            .block(block)
            .wrap(Wrap { trim: false })
            .scroll((self.scroll, 0))
            .render(area, buf);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::console::LogValue;
    use ratatui::backend::TestBackend;
    use ratatui::Terminal;

    fn entries() -> Vec<LogEntry> {
        vec![
            LogEntry::new(LogKind::Info, vec![LogValue::string("hi")]),
            LogEntry::new(
                LogKind::Warning,
                vec![LogValue::Object(vec![("a".to_string(), LogValue::Number(1.0))])],
            ),
            LogEntry::new(LogKind::Error, vec![LogValue::error("Error", "boom")]),
        ]
    }

    #[test]
    fn test_panel_text() {
        assert_eq!(
            panel_text(&entries()),
            "LOG OUTPUT\nⓘ hi\n⚠ {\n    \"a\": 1\n  }\n✖ Error: boom\n"
        );
    }

    #[test]
    fn test_line_styles() {
        let lines = panel_lines(&entries());
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].spans[1].style.fg, Some(Color::Blue));
        assert_eq!(lines[4].spans[1].style.fg, Some(Color::Red));
    }

    #[test]
    fn test_widget_renders_title_and_entries() {
        let entries = entries();
        let mut terminal = Terminal::new(TestBackend::new(30, 8)).unwrap();
        terminal
            .draw(|frame| frame.render_widget(LogPanel::new(&entries), frame.area()))
            .unwrap();
        let buffer = terminal.backend().buffer();
        let row = |y: usize| {
            buffer.content[y * 30..(y + 1) * 30]
                .iter()
                .map(|cell| cell.symbol())
                .collect::<String>()
        };
        assert!(row(0).contains("LOG OUTPUT"));
        assert!(row(1).starts_with("ⓘ hi"));
        assert!(row(5).starts_with("✖ Error: boom"));
        assert_eq!(LogPanel::new(&entries).height(), 6);
    }
}
