//! Terminal layout of mounted trees
//!
//! Lays host nodes out as styled terminal lines. Block tags start a new line,
//! inline tags flow within the current one; a handful of tags get a textual
//! stand-in (`[ button ]`, bullets, rules).

use super::node::RenderNode;
use crate::ui::theme::DEFAULT_THEME;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};

const INLINE_TAGS: [&str; 10] = ["span", "b", "strong", "i", "em", "u", "code", "a", "button", "label"];
const RULE_WIDTH: usize = 32;
const LIST_INDENT: usize = 2;

/// Lay out `nodes` as terminal lines
pub fn layout(nodes: &[RenderNode]) -> Vec<Line<'static>> {
    let mut writer = LineWriter::default();
    for node in nodes {
        writer.node(node, Style::default(), None);
    }
    writer.finish()
}

/// Lines without styling, one string per line
pub fn plain_text(lines: &[Line<'_>]) -> String {
    lines
        .iter()
        .map(|line| line.spans.iter().map(|span| span.content.as_ref()).collect::<String>())
        .collect::<Vec<_>>()
        .join("\n")
}

fn is_inline(tag: &str) -> bool {
    INLINE_TAGS.contains(&tag)
}

fn tag_style(tag: &str) -> Style {
    match tag {
        "h1" => Style::default()
            .fg(DEFAULT_THEME.primary)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED),
        "h2" | "h3" | "h4" | "h5" | "h6" => Style::default().fg(DEFAULT_THEME.primary).add_modifier(Modifier::BOLD),
        "b" | "strong" => Style::default().add_modifier(Modifier::BOLD),
        "i" | "em" => Style::default().add_modifier(Modifier::ITALIC),
        "u" => Style::default().add_modifier(Modifier::UNDERLINED),
        "a" => Style::default().fg(DEFAULT_THEME.primary).add_modifier(Modifier::UNDERLINED),
        "code" | "pre" => Style::default().fg(DEFAULT_THEME.string).bg(DEFAULT_THEME.current_line_bg),
        "button" => Style::default().fg(DEFAULT_THEME.function).add_modifier(Modifier::BOLD),
        _ => Style::default(),
    }
}

#[derive(Clone, Copy)]
enum ListKind {
    Bullet,
    Ordered,
}

#[derive(Default)]
struct LineWriter {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    indent: usize,
    /// Bullet or ordinal waiting for the first text of a list item
    marker: Option<String>,
}

impl LineWriter {
    fn finish(mut self) -> Vec<Line<'static>> {
        self.end_line();
        self.lines
    }

    /// Close the current line if it has content
    fn end_line(&mut self) {
        if !self.current.is_empty() {
            self.lines.push(Line::from(std::mem::take(&mut self.current)));
        }
    }

    /// `<br/>`: always ends a line, possibly an empty one
    fn hard_break(&mut self) {
        self.lines.push(Line::from(std::mem::take(&mut self.current)));
    }

    fn text(&mut self, text: &str, style: Style) {
        for (index, part) in text.split('\n').enumerate() {
            if index > 0 {
                self.hard_break();
            }
            if part.is_empty() {
                continue;
            }
            self.start_line();
            self.current.push(Span::styled(part.to_string(), style));
        }
    }

    fn start_line(&mut self) {
        if !self.current.is_empty() {
            return;
        }
        if self.indent > 0 {
            self.current.push(Span::raw(" ".repeat(self.indent)));
        }
        if let Some(marker) = self.marker.take() {
            self.current
                .push(Span::styled(marker, Style::default().fg(DEFAULT_THEME.secondary)));
        }
    }

    fn node(&mut self, node: &RenderNode, style: Style, list: Option<ListKind>) {
        match node {
            RenderNode::Text { text } => self.text(text, style),
            RenderNode::Element { tag, children, .. } => {
                let mut style = style.patch(tag_style(tag));
                if let Some(color) = node.attribute("color").and_then(|c| c.parse::<Color>().ok()) {
                    style = style.fg(color);
                }
                self.element(node, tag, children, style, list);
            }
        }
    }

    fn children(&mut self, children: &[RenderNode], style: Style, list: Option<ListKind>) {
        for child in children {
            self.node(child, style, list);
        }
    }

    fn element(&mut self, node: &RenderNode, tag: &str, children: &[RenderNode], style: Style, list: Option<ListKind>) {
        match tag {
            "br" => self.hard_break(),
            "hr" => {
                self.end_line();
                self.text(&"─".repeat(RULE_WIDTH), Style::default().fg(DEFAULT_THEME.comment));
                self.end_line();
            }
            "button" => {
                self.text("[ ", style);
                self.children(children, style, None);
                self.text(" ]", style);
            }
            "input" => {
                let (text, style) = match (node.attribute("value"), node.attribute("placeholder")) {
                    (Some(value), _) => (value, style),
                    (None, Some(placeholder)) => (placeholder, style.fg(DEFAULT_THEME.comment)),
                    (None, None) => ("", style),
                };
                self.text(&format!("[{}]", text), style);
            }
            "img" => {
                let alt = node.attribute("alt").unwrap_or("image");
                self.text(&format!("[{}]", alt), style.fg(DEFAULT_THEME.comment));
            }
            "ul" | "ol" => {
                let kind = if tag == "ol" { ListKind::Ordered } else { ListKind::Bullet };
                self.end_line();
                self.indent += LIST_INDENT;
                let mut ordinal = 0;
                for child in children {
                    if child.tag() == Some("li") {
                        ordinal += 1;
                        self.marker = Some(match kind {
                            ListKind::Bullet => "• ".to_string(),
                            ListKind::Ordered => format!("{}. ", ordinal),
                        });
                    }
                    self.node(child, style, Some(kind));
                }
                self.marker = None;
                self.end_line();
                self.indent -= LIST_INDENT;
            }
            "li" => {
                self.end_line();
                if list.is_none() {
                    self.marker = Some("• ".to_string());
                }
                self.children(children, style, None);
                self.end_line();
            }
            tag if is_inline(tag) => self.children(children, style, None),
            _ => {
                self.end_line();
                self.children(children, style, None);
                self.end_line();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str, children: Vec<RenderNode>) -> RenderNode {
        RenderNode::element(tag, Vec::new(), children)
    }

    fn text(s: &str) -> RenderNode {
        RenderNode::text(s)
    }

    #[test]
    fn test_blocks_and_inlines() {
        let tree = el(
            "div",
            vec![
                el("h1", vec![text("Title")]),
                el("p", vec![text("Hello "), el("b", vec![text("world")]), text("!")]),
                el("button", vec![text("Click")]),
            ],
        );
        let lines = layout(&[tree]);
        assert_eq!(plain_text(&lines), "Title\nHello world!\n[ Click ]");
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_lists() {
        let tree = el(
            "div",
            vec![
                el("ul", vec![el("li", vec![text("a")]), el("li", vec![text("b")])]),
                el("ol", vec![el("li", vec![text("x")]), el("li", vec![text("y")])]),
            ],
        );
        assert_eq!(plain_text(&layout(&[tree])), "  • a\n  • b\n  1. x\n  2. y");
    }

    #[test]
    fn test_breaks_and_rules() {
        let tree = el("p", vec![text("one"), el("br", vec![]), text("two"), el("hr", vec![])]);
        let rendered = plain_text(&layout(&[tree]));
        assert_eq!(rendered, format!("one\ntwo\n{}", "─".repeat(RULE_WIDTH)));
    }

    #[test]
    fn test_color_attribute() {
        let tree = RenderNode::element(
            "span",
            vec![("color".to_string(), "red".to_string())],
            vec![text("alert")],
        );
        let lines = layout(&[tree]);
        assert_eq!(lines[0].spans[0].style.fg, Some(Color::Red));
    }

    #[test]
    fn test_input_placeholder() {
        let tree = RenderNode::element(
            "input",
            vec![("placeholder".to_string(), "name".to_string())],
            Vec::new(),
        );
        assert_eq!(plain_text(&layout(&[tree])), "[name]");
    }
}
