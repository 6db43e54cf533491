//! Result pane rendering
//!
//! Draws the committed view: the mounted tree laid out as terminal lines, and
//! the log panel underneath whenever the view carries log entries.

use crate::log_panel::LogPanel;
use crate::render::layout::layout;
use crate::render::{Outcome, ResultView};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

/// Render the result pane. `scroll` applies to the mounted content.
pub fn render_result_pane(
    frame: &mut Frame,
    area: Rect,
    view: &ResultView,
    anchor: &str,
    is_focused: bool,
    scroll: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(format!(" Result #{} ", anchor))
        .borders(Borders::ALL)
        .border_style(border_style);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let (content_area, log_area) = if view.shows_log_panel() {
        let panel_height = LogPanel::new(&view.logs).height();
        // the log panel gets at most half the pane unless nothing is mounted
        let max_height = if view.mounted.is_empty() {
            inner.height
        } else {
            inner.height / 2
        };
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(panel_height.min(max_height))])
            .split(inner);
        (chunks[0], Some(chunks[1]))
    } else {
        (inner, None)
    };

    let lines = layout(&view.mounted);
    let visible_height = content_area.height.max(1) as usize;
    *scroll = (*scroll).min(lines.len().saturating_sub(visible_height));

    if lines.is_empty() {
        let placeholder = match view.outcome {
            Outcome::Failed => "",
            _ => "(nothing rendered)",
        };
        frame.render_widget(
            Paragraph::new(placeholder).style(Style::default().fg(DEFAULT_THEME.comment)),
            content_area,
        );
    } else {
        frame.render_widget(
            Paragraph::new(lines)
                .wrap(Wrap { trim: false })
                .scroll((u16::try_from(*scroll).unwrap_or(u16::MAX), 0)),
            content_area,
        );
    }

    if let Some(log_area) = log_area {
        frame.render_widget(LogPanel::new(&view.logs), log_area);
    }
}
