//! Character-level edits: typing, deletion and line breaks.

use unicode_segmentation::UnicodeSegmentation;

use super::Editor;
use crate::error::{Error, Result};
use crate::journal::{Coalesce, Edit};
use crate::slice::SliceRange;
use crate::text::{TextBuffer, fix_line_endings};

impl<B: TextBuffer> Editor<B> {
    /// Type `text` at the caret, replacing the selection if there is one.
    ///
    /// Consecutive typing coalesces into one undo record. An opening
    /// parenthesis starts a new record so a call tip inserted after it can
    /// be undone on its own.
    pub fn type_text(&mut self, text: &str) -> Result<()> {
        if self.doc.has_selection() {
            return self.replace_selection(text);
        }
        let coalesce = if text == "(" { Coalesce::Fresh } else { Coalesce::Allow };
        let end = self.insert(self.doc.caret(), text, coalesce)?;
        self.doc.set_caret(end);
        Ok(())
    }

    /// Insert `text` at `pos`. Returns the offset just past the inserted text.
    ///
    /// New lines continue the I/O-slice at `pos`. Fails with
    /// [`Error::ReadOnlyRegion`] on an output line, and on any line but the
    /// readline line while a readline is pending.
    pub fn insert(&mut self, pos: usize, text: &str, coalesce: Coalesce) -> Result<usize> {
        let text = fix_line_endings(text);
        let pos = pos.min(self.doc.len_chars());
        if text.is_empty() {
            return Ok(pos);
        }
        let line = self.doc.line_of(pos);
        self.check_editable(line)?;
        if self.readline_line().is_some() && text.contains('\n') {
            return Err(Error::ReadOnlyRegion { line });
        }

        let pending = self.begin();
        let end = self.doc.raw_insert(pos, &text);
        let edit = Edit::insert(pos, line, &text);
        let hi = line + edit.num_lines;
        self.doc.markers_mut().reflow(line, hi);
        self.finish(pending, line, hi, edit, coalesce)?;
        Ok(end)
    }

    /// Delete `start..end` as one undo record.
    ///
    /// Both ends must lie in the same input I/O-slice.
    pub fn delete(&mut self, start: usize, end: usize) -> Result<()> {
        self.delete_range(start, end, Coalesce::Never)
    }

    pub(crate) fn delete_range(&mut self, start: usize, end: usize, coalesce: Coalesce) -> Result<()> {
        let len = self.doc.len_chars();
        let (start, end) = (start.min(end).min(len), start.max(end).min(len));
        if start == end {
            return Ok(());
        }
        let first = self.doc.line_of(start);
        let last = self.doc.line_of(end);
        self.check_editable(first)?;
        self.check_editable(last)?;
        if !self.doc.io_slice(first).contains(last) {
            return Err(Error::IllegalAdjacency { line: last });
        }

        let pending = self.begin();
        let removed = self.doc.raw_remove(start, end);
        let edit = Edit::delete(start, first, &removed);
        self.doc.markers_mut().reflow(first, first);
        self.finish(pending, first, first, edit, coalesce)
    }

    /// Delete the grapheme before the caret, or the selection.
    ///
    /// Returns `Ok(false)` when nothing can be deleted: at the start of the
    /// document, or at the first column of a slice, where joining would
    /// cross a slice boundary.
    pub fn backspace(&mut self) -> Result<bool> {
        if self.doc.has_selection() {
            let (start, end) = self.doc.selection();
            self.delete_range(start, end, Coalesce::Never)?;
            return Ok(true);
        }
        let caret = self.doc.caret();
        if caret == 0 {
            return Ok(false);
        }
        let line = self.doc.line_of(caret);
        self.check_editable(line)?;
        let line_start = self.doc.line_start(line);
        let start = if caret == line_start {
            if self.doc.io_slice(line).start == line {
                return Ok(false);
            }
            caret - 1
        } else {
            let head = self.doc.text_range(line_start, caret);
            let width = head
                .graphemes(true)
                .next_back()
                .map_or(1, |g| g.chars().count());
            caret - width
        };
        self.delete_range(start, caret, Coalesce::Allow)?;
        Ok(true)
    }

    /// Delete the grapheme after the caret, or the selection.
    pub fn delete_forward(&mut self) -> Result<bool> {
        if self.doc.has_selection() {
            let (start, end) = self.doc.selection();
            self.delete_range(start, end, Coalesce::Never)?;
            return Ok(true);
        }
        let caret = self.doc.caret();
        if caret >= self.doc.len_chars() {
            return Ok(false);
        }
        let line = self.doc.line_of(caret);
        self.check_editable(line)?;
        let line_end = self.doc.line_end(line);
        let end = if caret == line_end {
            if self.doc.io_slice(line).end == line {
                return Ok(false);
            }
            caret + 1
        } else {
            let tail = self.doc.text_range(caret, line_end);
            caret + tail.graphemes(true).next().map_or(1, |g| g.chars().count())
        };
        self.delete_range(caret, end, Coalesce::Allow)?;
        Ok(true)
    }

    /// Replace the selection with `text`; with no selection, insert at the caret.
    pub fn replace_selection(&mut self, text: &str) -> Result<()> {
        let (start, end) = self.doc.selection();
        if start != end {
            if self.readline_line().is_some() && text.contains('\n') {
                return Err(Error::ReadOnlyRegion {
                    line: self.doc.line_of(start),
                });
            }
            self.delete_range(start, end, Coalesce::Never)?;
        }
        let end = self.insert(start, text, Coalesce::Never)?;
        self.doc.set_caret(end);
        Ok(())
    }

    /// Break the line at the caret.
    ///
    /// With `auto_indent` the new line copies the indentation of the text
    /// before the caret, plus four spaces after a line ending in `:`.
    pub fn insert_line_break(&mut self, auto_indent: bool) -> Result<()> {
        let mut text = String::from("\n");
        if auto_indent {
            let caret = self.doc.caret();
            let line_start = self.doc.line_start(self.doc.line_of(caret));
            let head = self.doc.text_range(line_start, caret);
            text.extend(head.chars().take_while(|c| *c == ' ' || *c == '\t'));
            if head.trim_end().ends_with(':') {
                text.push_str("    ");
            }
        }
        self.type_text(&text)
    }

    /// Empty the input slice under the caret (or the pending readline line).
    ///
    /// Returns `Ok(false)` if it was already empty.
    pub fn clear_command(&mut self) -> Result<bool> {
        let range = match self.readline_line() {
            Some(line) => SliceRange::new(line, line),
            None => {
                let line = self.doc.caret_line();
                self.check_editable(line)?;
                self.doc.io_slice(line)
            }
        };
        let start = self.doc.line_start(range.start);
        let end = self.doc.line_end(range.end);
        if start == end {
            return Ok(false);
        }
        self.delete_range(start, end, Coalesce::Never)?;
        self.doc.set_caret(start);
        Ok(true)
    }
}
