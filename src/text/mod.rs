//! Text storage behind the slice document.
//!
//! The shell core never talks to a concrete widget. It reads and edits text
//! through the narrow [`TextBuffer`] trait; [`RopeBuffer`] is the in-memory
//! implementation used by default and in tests. A host widget can implement
//! the trait directly and keep its own storage.
//!
//! Positions are character offsets. Lines are separated by `\n` only: all
//! text entering the core passes through [`fix_line_endings`] first.
//!
//! # Examples
//!
//! ```
//! use sliceshell::text::{RopeBuffer, TextBuffer};
//!
//! let mut buffer = RopeBuffer::from_str("a=1\nb=2");
//! assert_eq!(buffer.len_lines(), 2);
//! buffer.insert(3, "0");
//! assert_eq!(buffer.line_text(0), "a=10");
//! ```

mod rope;

pub use rope::RopeBuffer;

/// Line-oriented text storage.
pub trait TextBuffer {
    /// Number of characters.
    fn len_chars(&self) -> usize;

    /// Number of lines. An empty buffer, or one ending in `\n`, still has a last (empty) line.
    fn len_lines(&self) -> usize;

    /// Character offset of the start of `line`. Lines past the end map to `len_chars()`.
    fn line_to_char(&self, line: usize) -> usize;

    /// Line containing the character offset `pos` (clamped to the buffer).
    fn char_to_line(&self, pos: usize) -> usize;

    /// Text of `line` without its trailing newline.
    fn line_text(&self, line: usize) -> String;

    /// Character at `pos`, if any.
    fn char_at(&self, pos: usize) -> Option<char>;

    /// Text between two character offsets.
    fn slice(&self, start: usize, end: usize) -> String;

    /// Insert `text` at `pos`.
    fn insert(&mut self, pos: usize, text: &str);

    /// Remove the characters in `start..end`.
    fn remove(&mut self, start: usize, end: usize);

    /// Replace the whole content.
    fn set_text(&mut self, text: &str);

    /// Whole content.
    fn text(&self) -> String {
        self.slice(0, self.len_chars())
    }

    /// Offset just before the newline that ends `line` (or the end of the buffer).
    fn line_end(&self, line: usize) -> usize {
        if line + 1 < self.len_lines() {
            self.line_to_char(line + 1) - 1
        } else {
            self.len_chars()
        }
    }
}

/// Convert `\r\n` and lone `\r` to `\n`.
#[must_use]
pub fn fix_line_endings(text: &str) -> String {
    if !text.contains('\r') {
        return text.to_string();
    }
    text.replace("\r\n", "\n").replace('\r', "\n")
}
