//! Editor pane rendering with syntax highlighting
//!
//! Shows the snippet being edited with line numbers, the cursor line
//! highlighted and the terminal cursor placed at the edit position.
//!
//! # Rendering
//!
//! The pane uses a simple character-by-character tokenizer to apply syntax
//! highlighting styles without requiring a full lexer.

use crate::ui::editor::EditorBuffer;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Position, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

const GUTTER_WIDTH: u16 = 5;

/// Simple syntax highlighting for snippet source
fn highlight_line(line: &str) -> Line<'static> {
    let mut spans = Vec::new();
    let mut current_word = String::new();
    let chars: Vec<char> = line.chars().collect();
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];

        // Handle comments
        if c == '/' && chars.get(i + 1) == Some(&'/') {
            flush_word(&mut spans, &mut current_word, false);
            spans.push(Span::styled(
                chars[i..].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.comment),
            ));
            break;
        }

        // Handle strings
        if matches!(c, '"' | '\'' | '`') {
            flush_word(&mut spans, &mut current_word, false);
            let mut end = i + 1;
            while end < chars.len() && chars[end] != c {
                end += if chars[end] == '\\' { 2 } else { 1 };
            }
            end = (end + 1).min(chars.len());
            spans.push(Span::styled(
                chars[i..end].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.string),
            ));
            i = end;
            continue;
        }

        // Markup tag names: `<div`, `</div`, `<Card`
        if c == '<' {
            flush_word(&mut spans, &mut current_word, false);
            let mut end = i + 1;
            if chars.get(end) == Some(&'/') {
                end += 1;
            }
            let name_start = end;
            while end < chars.len() && (chars[end].is_alphanumeric() || matches!(chars[end], '.' | '-' | '_')) {
                end += 1;
            }
            spans.push(Span::styled(
                chars[i..name_start].iter().collect::<String>(),
                Style::default().fg(DEFAULT_THEME.fg),
            ));
            if end > name_start && chars[name_start].is_alphabetic() {
                spans.push(Span::styled(
                    chars[name_start..end].iter().collect::<String>(),
                    Style::default().fg(DEFAULT_THEME.tag),
                ));
            } else {
                current_word.extend(&chars[name_start..end]);
            }
            i = end;
            continue;
        }

        // Handle non-alphanumeric (delimiters)
        if !c.is_alphanumeric() && c != '_' && c != '$' {
            flush_word(&mut spans, &mut current_word, c == '(');
            let style = match c {
                '{' | '}' | '(' | ')' | '[' | ']' => Style::default().fg(DEFAULT_THEME.primary), // Brackets
                _ => Style::default().fg(DEFAULT_THEME.fg),
            };
            spans.push(Span::styled(c.to_string(), style));
            i += 1;
            continue;
        }

        current_word.push(c);
        i += 1;
    }

    flush_word(&mut spans, &mut current_word, false);
    Line::from(spans)
}

fn flush_word(spans: &mut Vec<Span<'static>>, word: &mut String, is_call: bool) {
    if !word.is_empty() {
        let style = get_keyword_style(word, is_call);
        spans.push(Span::styled(std::mem::take(word), style));
    }
}

fn get_keyword_style(word: &str, is_function: bool) -> Style {
    match word {
        "const" | "let" | "var" | "function" | "return" | "if" | "else" | "while" | "for" | "do" | "of"
        | "in" | "break" | "continue" | "new" | "throw" | "try" | "catch" | "finally" | "typeof"
        | "instanceof" | "import" | "export" | "from" | "default" | "interface" | "type" | "as" => {
            Style::default()
                .fg(DEFAULT_THEME.keyword)
                .add_modifier(Modifier::BOLD) // Keywords
        }
        "true" | "false" | "null" | "undefined" | "this" => Style::default().fg(DEFAULT_THEME.number), // Constants
        _ if word.chars().next().is_some_and(|c| c.is_ascii_digit()) => Style::default().fg(DEFAULT_THEME.number),
        _ if is_function => Style::default().fg(DEFAULT_THEME.function),
        _ => Style::default().fg(DEFAULT_THEME.fg), // Variables/Identifiers
    }
}

/// Render the editor pane
pub fn render_editor_pane(frame: &mut Frame, area: Rect, editor: &EditorBuffer, is_focused: bool, scroll: &mut usize) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let block = Block::default()
        .title(" Snippet ")
        .borders(Borders::ALL)
        .border_style(border_style);

    let (cursor_row, cursor_col) = editor.cursor();
    let visible_height = area.height.saturating_sub(2).max(1) as usize; // Account for borders (2), min 1

    // Keep the cursor line visible
    if cursor_row < *scroll {
        *scroll = cursor_row;
    } else if cursor_row >= *scroll + visible_height {
        *scroll = cursor_row + 1 - visible_height;
    }

    let visible_lines: Vec<Line> = editor
        .lines()
        .iter()
        .enumerate()
        .skip(*scroll)
        .take(visible_height)
        .map(|(idx, line)| {
            let is_current = idx == cursor_row;
            let num_style = if is_current {
                Style::default()
                    .fg(DEFAULT_THEME.secondary)
                    .add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(DEFAULT_THEME.comment) // Line numbers
            };

            let mut content_line = highlight_line(line);
            if is_current {
                for span in &mut content_line.spans {
                    span.style = span.style.patch(Style::default().bg(DEFAULT_THEME.current_line_bg));
                }
            }

            let mut final_spans = vec![Span::styled(format!("{:4} ", idx + 1), num_style)];
            final_spans.extend(content_line.spans);
            Line::from(final_spans)
        })
        .collect();

    frame.render_widget(Paragraph::new(visible_lines).block(block), area);

    if is_focused {
        if let Some(position) = cursor_position(area, cursor_row - *scroll, cursor_col) {
            frame.set_cursor_position(position);
        }
    }
}

/// Terminal cell for the edit position, if it falls inside the pane
fn cursor_position(area: Rect, row: usize, col: usize) -> Option<Position> {
    let row = u16::try_from(row).ok()?;
    let col = u16::try_from(col).ok()?;
    let x = area.x.saturating_add(1 + GUTTER_WIDTH).saturating_add(col);
    let y = area.y.saturating_add(1).saturating_add(row);
    (x < area.right().saturating_sub(1) && y < area.bottom().saturating_sub(1)).then(|| Position::new(x, y))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_of(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn test_highlight_keeps_text() {
        let source = r#"const el = <Card title="x">{n + 1}</Card> // done"#;
        assert_eq!(text_of(&highlight_line(source)), source);
    }

    #[test]
    fn test_highlight_styles() {
        let line = highlight_line("const s = 'hi'");
        assert_eq!(line.spans[0].style.fg, Some(DEFAULT_THEME.keyword));
        let string = line.spans.iter().find(|span| span.content == "'hi'");
        assert_eq!(string.and_then(|span| span.style.fg), Some(DEFAULT_THEME.string));

        let markup = highlight_line("<div>");
        assert!(markup.spans.iter().any(|span| span.content == "div" && span.style.fg == Some(DEFAULT_THEME.tag)));
    }

    #[test]
    fn test_cursor_position_stays_inside_pane() {
        let area = Rect::new(2, 1, 40, 10);
        assert_eq!(cursor_position(area, 0, 0), Some(Position::new(8, 2)));
        assert_eq!(cursor_position(area, 3, 10), Some(Position::new(18, 5)));
        assert_eq!(cursor_position(area, 0, 40), None);
        assert_eq!(cursor_position(area, 9, 0), None);

        // wraps to column 0 under a plain cast
        assert_eq!(cursor_position(area, 0, 65_536), None);
        assert_eq!(cursor_position(area, 0, usize::MAX), None);
        assert_eq!(cursor_position(Rect::new(u16::MAX - 4, 0, 4, 4), 0, 0), None);
    }
}
