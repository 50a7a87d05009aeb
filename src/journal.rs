//! Undo/redo journal covering text edits and marker changes.
//!
//! Each [`HistoryAction`] records a text delta plus two marker snapshots:
//! the lines around the change before it happened, and the same area (one
//! grouping wider on each side) afterwards. Undo replays the inverse text
//! delta and restores the `before` snapshot; redo replays the delta and
//! restores the `after` snapshot. The journal never edits the document
//! except through those replays.

use crate::document::Document;
use crate::marker::{MarkerSnapshot, MarkerStore};
use crate::slice::grouping_slice;
use crate::text::TextBuffer;

/// Default maximum number of actions to retain.
pub const DEFAULT_MAX_JOURNAL_DEPTH: usize = 1000;

/// What an action changed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActionKind {
    Insert,
    Delete,
    Marker,
}

/// How a new action relates to the previous one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Coalesce {
    /// Extend the previous action when adjacent (typing, backspace runs).
    #[default]
    Allow,
    /// Start a new action that later typing may extend (e.g. after `(`).
    Fresh,
    /// Start a new action that nothing extends (paste, completion, structure).
    Never,
}

/// A text delta about to be journaled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Edit {
    pub kind: ActionKind,
    pub text: String,
    pub pos_start: usize,
    pub pos_end: usize,
    pub start_line: usize,
    pub num_lines: usize,
}

impl Edit {
    /// `text` inserted at `pos`, which lies on `line`.
    #[must_use]
    pub fn insert(pos: usize, line: usize, text: &str) -> Self {
        Self {
            kind: ActionKind::Insert,
            text: text.to_string(),
            pos_start: pos,
            pos_end: pos + text.chars().count(),
            start_line: line,
            num_lines: text.matches('\n').count(),
        }
    }

    /// `text` removed from `start`, which lies on `line`.
    #[must_use]
    pub fn delete(start: usize, line: usize, text: &str) -> Self {
        Self {
            kind: ActionKind::Delete,
            text: text.to_string(),
            pos_start: start,
            pos_end: start + text.chars().count(),
            start_line: line,
            num_lines: text.matches('\n').count(),
        }
    }

    /// Markers changed on lines `first..=last`.
    #[must_use]
    pub fn marker(pos_start: usize, pos_end: usize, first: usize, last: usize) -> Self {
        Self {
            kind: ActionKind::Marker,
            text: String::new(),
            pos_start,
            pos_end,
            start_line: first,
            num_lines: last.saturating_sub(first),
        }
    }
}

/// One journal record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryAction {
    pub kind: ActionKind,
    pub chars: String,
    pub pos_start: usize,
    pub pos_end: usize,
    pub start_line: usize,
    pub num_lines: usize,
    pub appendable: bool,
    pub before: MarkerSnapshot,
    pub after: MarkerSnapshot,
}

/// Undo/redo journal with bounded depth.
#[derive(Clone, Debug)]
pub struct Journal {
    actions: Vec<HistoryAction>,
    /// Number of actions currently applied; `actions[applied..]` is the redo tail.
    applied: usize,
    max_depth: usize,
}

impl Default for Journal {
    fn default() -> Self {
        Self {
            actions: Vec::new(),
            applied: 0,
            max_depth: DEFAULT_MAX_JOURNAL_DEPTH,
        }
    }
}

/// Lines `first..=last` widened to whole groupings plus one grouping on each side.
fn widened_span(markers: &MarkerStore, first: usize, last: usize) -> (usize, usize) {
    let n = markers.len();
    if n == 0 {
        return (0, 0);
    }
    let first = first.min(n - 1);
    let last = last.clamp(first, n - 1);
    let mut lo = grouping_slice(markers, first).start;
    if lo > 0 {
        lo = grouping_slice(markers, lo - 1).start;
    }
    let mut hi = grouping_slice(markers, last).end;
    if hi + 1 < n {
        hi = grouping_slice(markers, hi + 1).end;
    }
    (lo, hi)
}

fn capture(markers: &MarkerStore, first: usize, last: usize) -> MarkerSnapshot {
    let (lo, hi) = widened_span(markers, first, last);
    markers.snapshot(lo, hi)
}

impl Journal {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a journal keeping at most `max_depth` actions.
    #[must_use]
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: max_depth.max(1),
            ..Self::default()
        }
    }

    /// Record `edit`, given the markers before and after it was applied.
    pub fn record(&mut self, before: &MarkerStore, after: &MarkerStore, edit: Edit, coalesce: Coalesce) {
        if coalesce == Coalesce::Allow && self.try_extend(after, &edit) {
            return;
        }

        let before_last = match edit.kind {
            ActionKind::Insert => edit.start_line,
            ActionKind::Delete | ActionKind::Marker => edit.start_line + edit.num_lines,
        };
        let after_last = match edit.kind {
            ActionKind::Delete => edit.start_line,
            ActionKind::Insert | ActionKind::Marker => edit.start_line + edit.num_lines,
        };
        let action = HistoryAction {
            kind: edit.kind,
            before: capture(before, edit.start_line, before_last),
            after: capture(after, edit.start_line, after_last),
            chars: edit.text,
            pos_start: edit.pos_start,
            pos_end: edit.pos_end,
            start_line: edit.start_line,
            num_lines: edit.num_lines,
            appendable: coalesce != Coalesce::Never && edit.kind != ActionKind::Marker,
        };

        self.actions.truncate(self.applied);
        self.actions.push(action);
        if self.actions.len() > self.max_depth {
            let excess = self.actions.len() - self.max_depth;
            self.actions.drain(..excess);
        }
        self.applied = self.actions.len();
    }

    fn try_extend(&mut self, after: &MarkerStore, edit: &Edit) -> bool {
        if self.applied != self.actions.len() {
            return false;
        }
        let Some(top) = self.actions.last_mut() else {
            return false;
        };
        if !top.appendable || top.kind != edit.kind {
            return false;
        }
        match edit.kind {
            ActionKind::Insert if edit.pos_start == top.pos_end => {
                top.chars.push_str(&edit.text);
                top.pos_end = edit.pos_end;
                top.num_lines += edit.num_lines;
                top.after = capture(after, top.start_line, top.start_line + top.num_lines);
                true
            }
            ActionKind::Delete if edit.pos_start == top.pos_start => {
                top.chars.push_str(&edit.text);
                top.pos_end = top.pos_start + top.chars.chars().count();
                top.num_lines += edit.num_lines;
                top.after = capture(after, top.start_line, top.start_line);
                true
            }
            ActionKind::Delete if edit.pos_end == top.pos_start => {
                top.chars.insert_str(0, &edit.text);
                top.pos_start = edit.pos_start;
                top.start_line = edit.start_line;
                top.num_lines += edit.num_lines;
                top.after = capture(after, top.start_line, top.start_line);
                true
            }
            _ => false,
        }
    }

    /// Revert the most recent applied action. Returns `false` if there is none.
    pub fn undo<B: TextBuffer>(&mut self, doc: &mut Document<B>) -> bool {
        if self.applied == 0 {
            return false;
        }
        let action = &self.actions[self.applied - 1];
        doc.markers_mut().clear_selection();
        match action.kind {
            ActionKind::Insert => {
                doc.raw_remove(action.pos_start, action.pos_end);
                doc.set_caret(action.pos_start);
            }
            ActionKind::Delete => {
                let end = doc.raw_insert(action.pos_start, &action.chars);
                doc.set_caret(end);
            }
            ActionKind::Marker => {}
        }
        doc.markers_mut().restore(&action.before);
        self.applied -= 1;
        true
    }

    /// Re-apply the next undone action. Returns `false` if there is none.
    pub fn redo<B: TextBuffer>(&mut self, doc: &mut Document<B>) -> bool {
        let Some(action) = self.actions.get(self.applied) else {
            return false;
        };
        doc.markers_mut().clear_selection();
        match action.kind {
            ActionKind::Insert => {
                let end = doc.raw_insert(action.pos_start, &action.chars);
                doc.set_caret(end);
            }
            ActionKind::Delete => {
                let end = action.pos_start + action.chars.chars().count();
                doc.raw_remove(action.pos_start, end);
                doc.set_caret(action.pos_start);
            }
            ActionKind::Marker => {}
        }
        doc.markers_mut().restore(&action.after);
        self.applied += 1;
        true
    }

    /// Current position, usable with [`unwind_to`](Self::unwind_to).
    #[must_use]
    pub fn mark(&self) -> usize {
        self.applied
    }

    /// Undo back to `mark` and forget the undone actions.
    pub fn unwind_to<B: TextBuffer>(&mut self, mark: usize, doc: &mut Document<B>) {
        while self.applied > mark {
            if !self.undo(doc) {
                break;
            }
        }
        self.actions.truncate(self.applied);
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.applied > 0
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.applied < self.actions.len()
    }

    /// Number of recorded actions, including the redo tail.
    #[must_use]
    pub fn len(&self) -> usize {
        self.actions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Number of actions that can be undone.
    #[must_use]
    pub fn applied(&self) -> usize {
        self.applied
    }

    #[must_use]
    pub fn actions(&self) -> &[HistoryAction] {
        &self.actions
    }

    /// Drop every action: the current document becomes the savepoint.
    pub fn clear(&mut self) {
        self.actions.clear();
        self.applied = 0;
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth.max(1);
        if self.actions.len() > self.max_depth {
            let excess = self.actions.len() - self.max_depth;
            self.actions.drain(..excess);
            self.applied = self.applied.saturating_sub(excess);
        }
    }
}
