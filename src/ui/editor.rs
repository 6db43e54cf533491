//! Minimal line editor for the snippet
//!
//! Cursor columns count characters, not bytes.

/// Spaces inserted by Tab
const TAB_WIDTH: usize = 2;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorBuffer {
    lines: Vec<String>,
    row: usize,
    col: usize,
}

impl EditorBuffer {
    pub fn new(text: &str) -> Self {
        let mut buffer = EditorBuffer {
            lines: Vec::new(),
            row: 0,
            col: 0,
        };
        buffer.set_text(text);
        buffer
    }

    /// Replace the whole text and move the cursor to the start
    pub fn set_text(&mut self, text: &str) {
        self.lines = text.split('\n').map(|line| line.trim_end_matches('\r').to_string()).collect();
        self.row = 0;
        self.col = 0;
    }

    pub fn text(&self) -> String {
        self.lines.join("\n")
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    /// (row, column), both zero-based
    pub fn cursor(&self) -> (usize, usize) {
        (self.row, self.col)
    }

    fn line_len(&self, row: usize) -> usize {
        self.lines.get(row).map_or(0, |line| line.chars().count())
    }

    fn byte_index(&self, row: usize, col: usize) -> usize {
        let line = &self.lines[row];
        line.char_indices().nth(col).map_or(line.len(), |(index, _)| index)
    }

    pub fn insert_char(&mut self, c: char) {
        let index = self.byte_index(self.row, self.col);
        self.lines[self.row].insert(index, c);
        self.col += 1;
    }

    pub fn insert_tab(&mut self) {
        for _ in 0..TAB_WIDTH {
            self.insert_char(' ');
        }
    }

    pub fn insert_newline(&mut self) {
        let index = self.byte_index(self.row, self.col);
        let rest = self.lines[self.row].split_off(index);
        self.lines.insert(self.row + 1, rest);
        self.row += 1;
        self.col = 0;
    }

    /// Delete before the cursor, joining lines at column 0
    pub fn backspace(&mut self) -> bool {
        if self.col > 0 {
            self.col -= 1;
            let index = self.byte_index(self.row, self.col);
            self.lines[self.row].remove(index);
            true
        } else if self.row > 0 {
            let line = self.lines.remove(self.row);
            self.row -= 1;
            self.col = self.line_len(self.row);
            self.lines[self.row].push_str(&line);
            true
        } else {
            false
        }
    }

    /// Delete under the cursor, joining lines at the end of a line
    pub fn delete(&mut self) -> bool {
        if self.col < self.line_len(self.row) {
            let index = self.byte_index(self.row, self.col);
            self.lines[self.row].remove(index);
            true
        } else if self.row + 1 < self.lines.len() {
            let next = self.lines.remove(self.row + 1);
            self.lines[self.row].push_str(&next);
            true
        } else {
            false
        }
    }

    pub fn move_left(&mut self) {
        if self.col > 0 {
            self.col -= 1;
        } else if self.row > 0 {
            self.row -= 1;
            self.col = self.line_len(self.row);
        }
    }

    pub fn move_right(&mut self) {
        if self.col < self.line_len(self.row) {
            self.col += 1;
        } else if self.row + 1 < self.lines.len() {
            self.row += 1;
            self.col = 0;
        }
    }

    pub fn move_up(&mut self, count: usize) {
        self.row = self.row.saturating_sub(count);
        self.col = self.col.min(self.line_len(self.row));
    }

    pub fn move_down(&mut self, count: usize) {
        self.row = (self.row + count).min(self.lines.len() - 1);
        self.col = self.col.min(self.line_len(self.row));
    }

    pub fn move_home(&mut self) {
        self.col = 0;
    }

    pub fn move_end(&mut self) {
        self.col = self.line_len(self.row);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_newline() {
        let mut buffer = EditorBuffer::new("ab");
        buffer.move_right();
        buffer.insert_newline();
        buffer.insert_char('é');
        assert_eq!(buffer.text(), "a\néb");
        assert_eq!(buffer.cursor(), (1, 1));
    }

    #[test]
    fn test_backspace_joins_lines() {
        let mut buffer = EditorBuffer::new("one\ntwo");
        buffer.move_down(1);
        assert!(buffer.backspace());
        assert_eq!(buffer.text(), "onetwo");
        assert_eq!(buffer.cursor(), (0, 3));
        buffer.move_home();
        assert!(!buffer.backspace());
    }

    #[test]
    fn test_delete_and_motion() {
        let mut buffer = EditorBuffer::new("long line\nx");
        buffer.move_end();
        buffer.move_down(5);
        assert_eq!(buffer.cursor(), (1, 1));
        buffer.move_up(1);
        buffer.move_end();
        assert!(buffer.delete());
        assert_eq!(buffer.text(), "long linex");
        assert!(buffer.delete());
        assert_eq!(buffer.text(), "long line");
        assert!(!buffer.delete());
    }
}
