//! Structural edit engine.
//!
//! [`Editor`] owns a [`Document`] and its [`Journal`]. Every public mutation
//! goes through the same steps:
//!
//! 1. check that the touched lines may be edited,
//! 2. apply raw text and marker changes to the document,
//! 3. reflow the markers around the change and repair line 0,
//! 4. verify every touched line pair against the allow table,
//! 5. journal the action, or roll the change back if step 4 failed.
//!
//! Text operations live in `text.rs`, slice operations in `structure.rs`.
//!
//! # Examples
//!
//! ```
//! use sliceshell::Editor;
//!
//! let mut editor = Editor::new();
//! editor.type_text("a = 1").unwrap();
//! editor.insert_line_break(true).unwrap();
//! editor.type_text("b = 2").unwrap();
//! assert_eq!(editor.document().text(), "a = 1\nb = 2");
//!
//! editor.undo();
//! assert_eq!(editor.document().text(), "");
//! ```

mod structure;
mod text;

use crate::codec::SessionLayout;
use crate::document::Document;
use crate::error::{Error, Result};
use crate::event::{LogLevel, emit_log};
use crate::journal::{ActionKind, Coalesce, Edit, Journal};
use crate::marker::{IoKind, MarkerSet, MarkerStore};
use crate::text::{RopeBuffer, TextBuffer};

/// State captured before a mutation, used to roll it back.
pub(crate) struct Pending {
    markers: MarkerStore,
    caret: usize,
    anchor: usize,
}

/// A document with journaled, invariant-preserving edit operations.
#[derive(Clone, Debug)]
pub struct Editor<B: TextBuffer = RopeBuffer> {
    doc: Document<B>,
    journal: Journal,
    modified: bool,
}

impl Default for Editor<RopeBuffer> {
    fn default() -> Self {
        Self::new()
    }
}

impl Editor<RopeBuffer> {
    /// An editor over an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::with_document(Document::new())
    }
}

impl<B: TextBuffer> Editor<B> {
    pub fn with_document(doc: Document<B>) -> Self {
        Self {
            doc,
            journal: Journal::new(),
            modified: false,
        }
    }

    #[must_use]
    pub fn document(&self) -> &Document<B> {
        &self.doc
    }

    pub(crate) fn document_mut(&mut self) -> &mut Document<B> {
        &mut self.doc
    }

    #[must_use]
    pub fn journal(&self) -> &Journal {
        &self.journal
    }

    #[must_use]
    pub fn into_document(self) -> Document<B> {
        self.doc
    }

    /// Whether the document changed since the last [`mark_saved`](Self::mark_saved).
    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_saved(&mut self) {
        self.modified = false;
    }

    pub(crate) fn mark_modified(&mut self) {
        self.modified = true;
    }

    /// Move the caret, collapsing the selection.
    pub fn set_caret(&mut self, pos: usize) {
        self.doc.set_caret(pos);
    }

    pub fn set_selection(&mut self, anchor: usize, caret: usize) {
        self.doc.set_selection(anchor, caret);
    }

    /// Line currently waiting for readline input, if any.
    #[must_use]
    pub fn readline_line(&self) -> Option<usize> {
        self.doc
            .markers()
            .iter()
            .position(|m| m.contains(MarkerSet::INPUT_READLINE))
    }

    /// Whether `line` accepts text edits.
    ///
    /// While a readline is pending only the readline line is editable;
    /// otherwise every input line is.
    #[must_use]
    pub fn is_editable(&self, line: usize) -> bool {
        match self.readline_line() {
            Some(readline) => line == readline,
            None => self.doc.kind_of(line) == IoKind::Input,
        }
    }

    pub(crate) fn check_editable(&self, line: usize) -> Result<()> {
        if self.is_editable(line) {
            Ok(())
        } else {
            emit_log(LogLevel::Debug, &format!("refused edit on read-only line {line}"));
            Err(Error::ReadOnlyRegion { line })
        }
    }

    pub(crate) fn begin(&self) -> Pending {
        Pending {
            markers: self.doc.markers().clone(),
            caret: self.doc.caret(),
            anchor: self.doc.anchor(),
        }
    }

    /// Repair line 0, verify pairs around `lo..=hi`, then journal `edit`.
    ///
    /// On an illegal pair the text change described by `edit` is reverted
    /// and the markers and caret captured in `pending` are put back.
    pub(crate) fn finish(&mut self, pending: Pending, lo: usize, hi: usize, edit: Edit, coalesce: Coalesce) -> Result<()> {
        self.doc.markers_mut().restore_first_marker();
        let illegal = self
            .doc
            .markers()
            .first_illegal_pair(lo.saturating_sub(1), hi);
        if let Some(line) = illegal {
            self.rollback(pending, &edit);
            emit_log(
                LogLevel::Debug,
                &format!("refused edit: illegal marker pair at line {line}"),
            );
            return Err(Error::IllegalAdjacency { line });
        }
        self.journal
            .record(&pending.markers, self.doc.markers(), edit, coalesce);
        self.modified = true;
        Ok(())
    }

    fn rollback(&mut self, pending: Pending, edit: &Edit) {
        match edit.kind {
            ActionKind::Insert => {
                self.doc.raw_remove(edit.pos_start, edit.pos_end);
            }
            ActionKind::Delete => {
                self.doc.raw_insert(edit.pos_start, &edit.text);
            }
            ActionKind::Marker => {}
        }
        self.doc.replace_markers(pending.markers);
        self.doc.set_selection(pending.anchor, pending.caret);
    }

    /// Undo the most recent action. Returns `false` when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let done = self.journal.undo(&mut self.doc);
        if done {
            self.modified = true;
        }
        done
    }

    /// Redo the most recently undone action.
    pub fn redo(&mut self) -> bool {
        let done = self.journal.redo(&mut self.doc);
        if done {
            self.modified = true;
        }
        done
    }

    /// Delete everything, leaving one empty input grouping and no journal.
    pub fn clear_all(&mut self) {
        self.load_layout(&SessionLayout::new().grouping(IoKind::Input, ""));
        self.modified = true;
        emit_log(LogLevel::Debug, "document cleared");
    }

    /// Drop all undo history.
    pub fn clear_journal(&mut self) {
        self.journal.clear();
    }

    pub fn set_max_journal_depth(&mut self, depth: usize) {
        self.journal.set_max_depth(depth);
    }

    /// Ensure line 0 opens a grouping and an I/O-slice.
    pub fn restore_first_marker(&mut self) -> bool {
        self.doc.markers_mut().restore_first_marker()
    }

    /// Check every marker invariant.
    pub fn validate(&self) -> Result<()> {
        match self.doc.markers().first_invalid_line() {
            Some(line) => Err(Error::CorruptMarkerState { line }),
            None => Ok(()),
        }
    }

    /// Re-derive every marker from the start markers, then validate.
    ///
    /// Lines whose markers cannot be classified fall back to continuing
    /// the slice above them.
    pub fn clean_all_markers(&mut self) -> Result<()> {
        let markers = self.doc.markers_mut();
        for line in 0..markers.len() {
            let m = markers.markers_of(line);
            if m.io_kind().is_none() || m.grouping().is_none() {
                markers.set_raw(line, (m & MarkerSet::READLINE) | MarkerSet::continuation(IoKind::Input));
            } else {
                markers.normalize(line);
            }
        }
        markers.restore_first_marker();
        markers.reflow_all();
        let result = self.validate();
        if let Err(e) = &result {
            emit_log(LogLevel::Error, &format!("marker repair failed: {e}"));
        }
        result
    }
}

/// Lines 0-1 input and line 2 output (one grouping), then an empty input grouping.
#[cfg(test)]
pub(crate) fn sample_editor() -> Editor {
    use crate::marker::IoRole;

    let markers = MarkerStore::from_sets(vec![
        MarkerSet::grouping_start(IoKind::Input),
        MarkerSet::continuation(IoKind::Input),
        MarkerSet::GROUP_MIDDLE | IoKind::Output.marker(IoRole::Start),
        MarkerSet::grouping_start(IoKind::Input),
    ]);
    let mut doc = Document::new();
    doc.set_content("a=1\nb=2\n3\n", markers);
    Editor::with_document(doc)
}
