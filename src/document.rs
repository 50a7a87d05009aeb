//! A text buffer paired with its line markers.
//!
//! [`Document`] owns the text (through a [`TextBuffer`]), the
//! [`MarkerStore`] indexed by the same line numbers, and the caret/selection.
//! Its `raw_*` primitives keep text and markers the same length; they do not
//! check editability or journal anything. The edit engine builds every public
//! operation on top of them.

use crate::marker::{IoKind, MarkerSet, MarkerStore};
use crate::slice::{self, SliceRange};
use crate::text::{RopeBuffer, TextBuffer};

/// Text, markers and caret of one shell document.
#[derive(Clone, Debug)]
pub struct Document<B: TextBuffer = RopeBuffer> {
    buffer: B,
    markers: MarkerStore,
    caret: usize,
    anchor: usize,
}

impl Default for Document<RopeBuffer> {
    fn default() -> Self {
        Self::new()
    }
}

impl Document<RopeBuffer> {
    /// An empty document: one empty input line.
    #[must_use]
    pub fn new() -> Self {
        Self::with_buffer(RopeBuffer::new())
    }
}

impl<B: TextBuffer> Document<B> {
    /// Wrap an existing buffer. Its whole text becomes one input slice.
    pub fn with_buffer(buffer: B) -> Self {
        let mut markers = MarkerStore::new();
        markers.reset(buffer.len_lines());
        Self {
            buffer,
            markers,
            caret: 0,
            anchor: 0,
        }
    }

    /// Replace text and markers at once. `markers` must have one set per line.
    pub(crate) fn set_content(&mut self, text: &str, markers: MarkerStore) {
        self.buffer.set_text(text);
        debug_assert_eq!(markers.len(), self.buffer.len_lines());
        self.markers = markers;
        let end = self.buffer.len_chars();
        self.caret = end;
        self.anchor = end;
    }

    #[must_use]
    pub fn buffer(&self) -> &B {
        &self.buffer
    }

    #[must_use]
    pub fn markers(&self) -> &MarkerStore {
        &self.markers
    }

    pub(crate) fn markers_mut(&mut self) -> &mut MarkerStore {
        &mut self.markers
    }

    pub(crate) fn replace_markers(&mut self, markers: MarkerStore) {
        self.markers = markers;
    }

    /// Markers of `line` (empty past the end).
    #[must_use]
    pub fn markers_of(&self, line: usize) -> MarkerSet {
        self.markers.markers_of(line)
    }

    #[must_use]
    pub fn text(&self) -> String {
        self.buffer.text()
    }

    #[must_use]
    pub fn len_chars(&self) -> usize {
        self.buffer.len_chars()
    }

    #[must_use]
    pub fn line_count(&self) -> usize {
        self.buffer.len_lines()
    }

    #[must_use]
    pub fn last_line(&self) -> usize {
        self.line_count().saturating_sub(1)
    }

    #[must_use]
    pub fn line_text(&self, line: usize) -> String {
        self.buffer.line_text(line)
    }

    /// Offset of the first character of `line`.
    #[must_use]
    pub fn line_start(&self, line: usize) -> usize {
        self.buffer.line_to_char(line)
    }

    /// Offset just before the newline ending `line`.
    #[must_use]
    pub fn line_end(&self, line: usize) -> usize {
        self.buffer.line_end(line)
    }

    #[must_use]
    pub fn line_of(&self, pos: usize) -> usize {
        self.buffer.char_to_line(pos)
    }

    #[must_use]
    pub fn column_of(&self, pos: usize) -> usize {
        pos - self.line_start(self.line_of(pos))
    }

    #[must_use]
    pub fn char_at(&self, pos: usize) -> Option<char> {
        self.buffer.char_at(pos)
    }

    #[must_use]
    pub fn text_range(&self, start: usize, end: usize) -> String {
        self.buffer.slice(start, end)
    }

    /// Text of lines `range.start..=range.end`, without the final newline.
    #[must_use]
    pub fn range_text(&self, range: SliceRange) -> String {
        self.text_range(self.line_start(range.start), self.line_end(range.end))
    }

    #[must_use]
    pub fn caret(&self) -> usize {
        self.caret
    }

    #[must_use]
    pub fn anchor(&self) -> usize {
        self.anchor
    }

    #[must_use]
    pub fn caret_line(&self) -> usize {
        self.line_of(self.caret)
    }

    /// Selected range, ordered.
    #[must_use]
    pub fn selection(&self) -> (usize, usize) {
        (self.caret.min(self.anchor), self.caret.max(self.anchor))
    }

    #[must_use]
    pub fn has_selection(&self) -> bool {
        self.caret != self.anchor
    }

    #[must_use]
    pub fn selected_text(&self) -> String {
        let (start, end) = self.selection();
        self.text_range(start, end)
    }

    /// Move the caret and collapse the selection.
    pub fn set_caret(&mut self, pos: usize) {
        let pos = pos.min(self.len_chars());
        self.caret = pos;
        self.anchor = pos;
    }

    /// Select from `anchor` to `caret`.
    pub fn set_selection(&mut self, anchor: usize, caret: usize) {
        let len = self.len_chars();
        self.anchor = anchor.min(len);
        self.caret = caret.min(len);
    }

    #[must_use]
    pub fn grouping_slice(&self, line: usize) -> SliceRange {
        slice::grouping_slice(&self.markers, line)
    }

    #[must_use]
    pub fn io_slice(&self, line: usize) -> SliceRange {
        slice::io_slice(&self.markers, line)
    }

    #[must_use]
    pub fn is_visible(&self, line: usize) -> bool {
        slice::is_visible(&self.markers, line)
    }

    /// I/O kind of `line`.
    #[must_use]
    pub fn kind_of(&self, line: usize) -> IoKind {
        self.markers_of(line).io_kind().unwrap_or(IoKind::Input)
    }

    /// Char range covering whole lines `first..=last`, including one line separator.
    ///
    /// For a run ending at the last line the separator before `first` is
    /// taken instead, so removing the range leaves no dangling empty line.
    #[must_use]
    pub fn line_run_span(&self, first: usize, last: usize) -> (usize, usize) {
        if last + 1 < self.line_count() {
            (self.line_start(first), self.line_start(last + 1))
        } else if first > 0 {
            (self.line_end(first - 1), self.len_chars())
        } else {
            (0, self.len_chars())
        }
    }

    /// Insert `text` at `pos`; new lines continue the slice at `pos`.
    ///
    /// Returns the offset just past the inserted text. Markers are not
    /// reflowed.
    pub(crate) fn raw_insert(&mut self, pos: usize, text: &str) -> usize {
        let pos = pos.min(self.len_chars());
        let line = self.line_of(pos);
        let kind = self.kind_of(line);
        self.buffer.insert(pos, text);
        let added = text.matches('\n').count();
        if added > 0 {
            self.markers
                .insert_lines(line, added, MarkerSet::continuation(kind));
        }
        let len = text.chars().count();
        self.caret = shift_for_insert(self.caret, pos, len);
        self.anchor = shift_for_insert(self.anchor, pos, len);
        pos + len
    }

    /// Remove `start..end`; the surviving joined line keeps the markers of the first line.
    pub(crate) fn raw_remove(&mut self, start: usize, end: usize) -> String {
        let end = end.min(self.len_chars());
        if start >= end {
            return String::new();
        }
        let first = self.line_of(start);
        let last = self.line_of(end);
        let removed = self.text_range(start, end);
        self.buffer.remove(start, end);
        if last > first {
            self.markers.remove_lines(first + 1, last);
        }
        self.caret = shift_for_remove(self.caret, start, end);
        self.anchor = shift_for_remove(self.anchor, start, end);
        removed
    }

    /// Remove whole lines `first..=last` with their markers.
    ///
    /// Returns the removed char range and text. Removing every line leaves
    /// one empty input line.
    pub(crate) fn raw_remove_lines(&mut self, first: usize, last: usize) -> (usize, usize, String) {
        let (start, end) = self.line_run_span(first, last);
        let removed = self.text_range(start, end);
        self.buffer.remove(start, end);
        if first == 0 && last + 1 >= self.markers.len() {
            self.markers.reset(1);
        } else {
            self.markers.remove_lines(first, last);
        }
        self.caret = shift_for_remove(self.caret, start, end);
        self.anchor = shift_for_remove(self.anchor, start, end);
        (start, end, removed)
    }

    /// Whether text and markers (ignoring gutter selection) equal `other`'s.
    #[must_use]
    pub fn same_content<C: TextBuffer>(&self, other: &Document<C>) -> bool {
        self.text() == other.text()
            && self.markers.len() == other.markers.len()
            && self
                .markers
                .iter()
                .zip(other.markers.iter())
                .all(|(a, b)| a - MarkerSet::SELECTING == b - MarkerSet::SELECTING)
    }
}

fn shift_for_insert(p: usize, pos: usize, len: usize) -> usize {
    if p >= pos { p + len } else { p }
}

fn shift_for_remove(p: usize, start: usize, end: usize) -> usize {
    if p >= end {
        p - (end - start)
    } else if p > start {
        start
    } else {
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_document_is_one_input_line() {
        let doc = Document::new();
        assert_eq!(doc.line_count(), 1);
        assert_eq!(doc.markers_of(0), MarkerSet::grouping_start(IoKind::Input));
        assert_eq!(doc.markers().len(), 1);
    }

    #[test]
    fn raw_insert_adds_continuation_lines() {
        let mut doc = Document::new();
        let end = doc.raw_insert(0, "a=1\nb=2\nc");
        assert_eq!(end, 9);
        assert_eq!(doc.line_count(), 3);
        assert_eq!(doc.markers().len(), 3);
        doc.markers_mut().reflow(0, 2);
        assert_eq!(doc.markers_of(2), MarkerSet::GROUP_END | MarkerSet::INPUT_END);
        assert_eq!(doc.caret(), 9);
    }

    #[test]
    fn raw_remove_keeps_first_line_markers() {
        let mut doc = Document::new();
        doc.raw_insert(0, "ab\ncd");
        doc.markers_mut().reflow(0, 1);
        let removed = doc.raw_remove(1, 4);
        assert_eq!(removed, "b\nc");
        assert_eq!(doc.text(), "ad");
        assert_eq!(doc.markers().len(), 1);
        assert!(doc.markers_of(0).is_grouping_start());
        assert_eq!(doc.caret(), 2);
    }

    #[test]
    fn remove_trailing_lines_takes_previous_separator() {
        let mut doc = Document::new();
        doc.raw_insert(0, "a\nb\nc");
        doc.markers_mut().reflow(0, 2);
        let (start, end, removed) = doc.raw_remove_lines(1, 2);
        assert_eq!((start, end), (1, 5));
        assert_eq!(removed, "\nb\nc");
        assert_eq!(doc.text(), "a");
        assert_eq!(doc.markers().len(), 1);
    }

    #[test]
    fn remove_all_lines_leaves_empty_input() {
        let mut doc = Document::new();
        doc.raw_insert(0, "a\nb");
        doc.raw_remove_lines(0, 1);
        assert_eq!(doc.text(), "");
        assert_eq!(doc.markers().len(), 1);
        assert_eq!(doc.markers_of(0), MarkerSet::grouping_start(IoKind::Input));
    }

    #[test]
    fn selection_is_ordered() {
        let mut doc = Document::new();
        doc.raw_insert(0, "hello");
        doc.set_selection(4, 1);
        assert_eq!(doc.selection(), (1, 4));
        assert_eq!(doc.selected_text(), "ell");
        doc.set_caret(99);
        assert_eq!(doc.caret(), 5);
        assert!(!doc.has_selection());
    }
}
