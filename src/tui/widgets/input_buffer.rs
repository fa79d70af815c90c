//! Shared text input buffer with cursor management.
//!
//! Used by the search bar, the collection switcher, and the manage form.
//! The cursor is a byte offset that always sits on a char boundary.

/// A single-line text input with cursor positioning.
#[derive(Debug, Clone, Default)]
pub struct InputBuffer {
    content: String,
    cursor: usize,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer prefilled with `text`, cursor at the end. Used by edit forms.
    pub fn with_text(text: impl Into<String>) -> Self {
        let content = text.into();
        let cursor = content.len();
        Self { content, cursor }
    }

    /// Previous char boundary before the cursor, or 0.
    fn prev_boundary(&self) -> usize {
        self.content[..self.cursor]
            .char_indices()
            .next_back()
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Next char boundary after the cursor, or the end of the buffer.
    fn next_boundary(&self) -> usize {
        self.content[self.cursor..]
            .chars()
            .next()
            .map(|c| self.cursor + c.len_utf8())
            .unwrap_or(self.content.len())
    }

    pub fn insert_char(&mut self, c: char) {
        self.content.insert(self.cursor, c);
        self.cursor += c.len_utf8();
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            let prev = self.prev_boundary();
            self.content.drain(prev..self.cursor);
            self.cursor = prev;
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.content.len() {
            let next = self.next_boundary();
            self.content.drain(self.cursor..next);
        }
    }

    pub fn move_left(&mut self) {
        if self.cursor > 0 {
            self.cursor = self.prev_boundary();
        }
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.content.len() {
            self.cursor = self.next_boundary();
        }
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.content.len();
    }

    /// Take the content out, resetting the buffer.
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.content)
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
    }

    /// Whitespace-only content counts as empty.
    pub fn is_empty(&self) -> bool {
        self.content.trim().is_empty()
    }

    pub fn text(&self) -> &str {
        &self.content
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_cursor() {
        let mut buf = InputBuffer::new();
        buf.insert_char('h');
        buf.insert_char('i');
        assert_eq!(buf.text(), "hi");
        assert_eq!(buf.cursor_position(), 2);
    }

    #[test]
    fn test_backspace_respects_char_boundaries() {
        let mut buf = InputBuffer::with_text("aß");
        buf.backspace();
        assert_eq!(buf.text(), "a");
        buf.backspace();
        assert!(buf.text().is_empty());
        buf.backspace();
        assert_eq!(buf.cursor_position(), 0);
    }

    #[test]
    fn test_delete_at_cursor() {
        let mut buf = InputBuffer::with_text("abc");
        buf.move_home();
        buf.delete();
        assert_eq!(buf.text(), "bc");
        assert_eq!(buf.cursor_position(), 0);
    }

    #[test]
    fn test_movement_over_multibyte() {
        let mut buf = InputBuffer::with_text("aé");
        assert_eq!(buf.cursor_position(), 3);
        buf.move_left();
        assert_eq!(buf.cursor_position(), 1);
        buf.move_left();
        assert_eq!(buf.cursor_position(), 0);
        buf.move_right();
        assert_eq!(buf.cursor_position(), 1);
        buf.move_end();
        assert_eq!(buf.cursor_position(), buf.text().len());
    }

    #[test]
    fn test_with_text_starts_at_end() {
        let mut buf = InputBuffer::with_text("quarterly");
        assert_eq!(buf.cursor_position(), 9);
        buf.insert_char('!');
        assert_eq!(buf.text(), "quarterly!");
    }

    #[test]
    fn test_take_resets() {
        let mut buf = InputBuffer::with_text("x");
        let text = buf.take();
        assert_eq!(text, "x");
        assert!(buf.text().is_empty());
        assert_eq!(buf.cursor_position(), 0);
    }

    #[test]
    fn test_is_empty_trims() {
        let mut buf = InputBuffer::new();
        assert!(buf.is_empty());
        buf.insert_char(' ');
        assert!(buf.is_empty());
        buf.insert_char('a');
        assert!(!buf.is_empty());
    }
}
