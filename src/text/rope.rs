//! Rope-backed [`TextBuffer`] using the ropey crate.

use ropey::Rope;

use super::TextBuffer;

/// In-memory text storage over a `ropey::Rope`.
///
/// ropey is built without its `unicode_lines` and `cr_lines` features, so
/// only `\n` starts a new line. That keeps line numbering in lockstep with the
/// marker array, which is indexed by the same lines.
#[derive(Clone, Debug, Default)]
pub struct RopeBuffer {
    rope: Rope,
}

impl RopeBuffer {
    /// Create an empty buffer.
    #[must_use]
    pub fn new() -> Self {
        Self { rope: Rope::new() }
    }

    /// Create a buffer holding `text`.
    #[must_use]
    pub fn from_str(text: &str) -> Self {
        Self {
            rope: Rope::from_str(text),
        }
    }

    /// Get access to the underlying rope.
    #[must_use]
    pub fn inner(&self) -> &Rope {
        &self.rope
    }
}

impl TextBuffer for RopeBuffer {
    fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    fn line_to_char(&self, line: usize) -> usize {
        if line >= self.rope.len_lines() {
            self.rope.len_chars()
        } else {
            self.rope.line_to_char(line)
        }
    }

    fn char_to_line(&self, pos: usize) -> usize {
        self.rope.char_to_line(pos.min(self.rope.len_chars()))
    }

    fn line_text(&self, line: usize) -> String {
        if line >= self.rope.len_lines() {
            return String::new();
        }
        let mut text = self.rope.line(line).to_string();
        if text.ends_with('\n') {
            text.pop();
        }
        text
    }

    fn char_at(&self, pos: usize) -> Option<char> {
        self.rope.get_char(pos)
    }

    fn slice(&self, start: usize, end: usize) -> String {
        let len = self.rope.len_chars();
        let end = end.min(len);
        let start = start.min(end);
        self.rope.slice(start..end).to_string()
    }

    fn insert(&mut self, pos: usize, text: &str) {
        let pos = pos.min(self.rope.len_chars());
        self.rope.insert(pos, text);
    }

    fn remove(&mut self, start: usize, end: usize) {
        let len = self.rope.len_chars();
        let end = end.min(len);
        if start < end {
            self.rope.remove(start..end);
        }
    }

    fn set_text(&mut self, text: &str) {
        self.rope = Rope::from_str(text);
    }
}

impl From<&str> for RopeBuffer {
    fn from(s: &str) -> Self {
        Self::from_str(s)
    }
}
