//! Slice-level edits: split, merge, fold, and whole-slice deletion.

use super::Editor;
use crate::error::{Error, Result};
use crate::journal::{Coalesce, Edit};
use crate::marker::{IoKind, IoRole, MarkerSet};
use crate::slice::{self, Axis, SliceRange};
use crate::text::TextBuffer;

fn with_grouping_fold(m: MarkerSet, folded: bool) -> MarkerSet {
    let start = if folded {
        MarkerSet::GROUP_START_FOLDED
    } else {
        MarkerSet::GROUP_START
    };
    (m - MarkerSet::GROUP_ANY_START) | start
}

fn with_io_fold(m: MarkerSet, folded: bool) -> MarkerSet {
    let kind = m.io_kind().unwrap_or(IoKind::Input);
    let role = if folded { IoRole::StartFolded } else { IoRole::Start };
    (m - MarkerSet::IO_ANY_START) | kind.marker(role)
}

impl<B: TextBuffer> Editor<B> {
    /// Split the input slice containing `line` so that `line` opens a new one.
    ///
    /// On the first line of the slice the split happens below it instead.
    /// The new slice opens its own grouping and takes any output that
    /// followed the original slice. Returns `Ok(false)` for a one-line slice.
    pub fn split(&mut self, line: usize) -> Result<bool> {
        if self.readline_line().is_some() {
            return Err(Error::ReadOnlyRegion { line });
        }
        if self.doc.kind_of(line) != IoKind::Input {
            return Err(Error::IllegalAdjacency { line });
        }
        let io = self.doc.io_slice(line);
        if io.start == io.end {
            return Ok(false);
        }
        let target = if line == io.start { line + 1 } else { line };

        let pending = self.begin();
        self.doc
            .markers_mut()
            .mark_grouping_start(target, IoKind::Input);
        self.doc.markers_mut().reflow(target, target);
        let pos = self.doc.line_start(target);
        let edit = Edit::marker(pos, pos, io.start, io.end);
        self.finish(pending, target, target, edit, Coalesce::Never)?;
        Ok(true)
    }

    /// Split at the caret line.
    pub fn split_at_caret(&mut self) -> Result<bool> {
        self.split(self.doc.caret_line())
    }

    /// Merge the gutter-selected I/O-slices into one.
    ///
    /// Uses the first contiguous selected run of one kind. Every slice
    /// start after the first line of the run becomes a continuation line,
    /// so groupings opened by those slices merge as well.
    pub fn merge_selected(&mut self) -> Result<bool> {
        let Some(selection) = slice::io_selection(self.doc.markers()) else {
            return Ok(false);
        };
        let range = selection.range;
        let starts: Vec<usize> = (range.start + 1..=range.end)
            .filter(|&line| {
                let m = self.doc.markers_of(line);
                m.is_io_start() || m.is_grouping_start()
            })
            .collect();
        if starts.is_empty() {
            return Ok(false);
        }

        let pending = self.begin();
        for &line in &starts {
            self.doc
                .markers_mut()
                .mark_continuation(line, selection.kind);
        }
        self.doc.markers_mut().reflow(range.start, range.end);
        let pos = self.doc.line_start(range.start);
        let edit = Edit::marker(pos, pos, range.start, range.end);
        self.finish(pending, range.start, range.end, edit, Coalesce::Never)?;
        self.doc.markers_mut().clear_selection();
        Ok(true)
    }

    /// Fold or unfold the slice containing `line` on `axis`.
    ///
    /// Folding a grouping also folds the I/O-slice on its first line; an
    /// I/O-slice that spans its whole grouping folds the grouping with it.
    /// Returns `Ok(false)` if the slice was already in that state.
    pub fn set_folded(&mut self, line: usize, axis: Axis, folded: bool) -> Result<bool> {
        let grouping = self.doc.grouping_slice(line);
        let io = self.doc.io_slice(line);
        let (start, both) = match axis {
            Axis::Grouping => (grouping.start, true),
            Axis::Io => (io.start, io == grouping),
        };
        let current = self.doc.markers_of(start);
        let mut next = with_io_fold(current, folded);
        if both {
            next = with_grouping_fold(next, folded);
        }
        if next == current {
            return Ok(false);
        }

        let pending = self.begin();
        self.doc.markers_mut().set_raw(start, next);
        self.doc.markers_mut().reflow(start, start);
        let pos = self.doc.line_start(start);
        self.finish(pending, start, start, Edit::marker(pos, pos, start, start), Coalesce::Never)?;
        if !self.doc.is_visible(self.doc.caret_line()) {
            self.doc.set_caret(self.doc.line_end(start));
        }
        Ok(true)
    }

    pub fn fold(&mut self, line: usize, axis: Axis) -> Result<bool> {
        self.set_folded(line, axis, true)
    }

    pub fn unfold(&mut self, line: usize, axis: Axis) -> Result<bool> {
        self.set_folded(line, axis, false)
    }

    /// Flip the fold state of the slice containing `line`.
    pub fn toggle_fold(&mut self, line: usize, axis: Axis) -> Result<bool> {
        let folded = match axis {
            Axis::Grouping => {
                let start = self.doc.grouping_slice(line).start;
                self.doc.markers_of(start).is_grouping_folded()
            }
            Axis::Io => {
                let start = self.doc.io_slice(line).start;
                self.doc.markers_of(start).is_io_folded()
            }
        };
        self.set_folded(line, axis, !folded)
    }

    /// Remove every line after the I/O-slice of `line` up to the end of its grouping.
    ///
    /// Returns `Ok(false)` for output lines and for slices that already end
    /// their grouping.
    pub fn delete_outputs_after(&mut self, line: usize) -> Result<bool> {
        if self.doc.kind_of(line) == IoKind::Output {
            return Ok(false);
        }
        let io = self.doc.io_slice(line);
        let grouping = self.doc.grouping_slice(line);
        if io.end >= grouping.end {
            return Ok(false);
        }

        let pending = self.begin();
        let (span_start, _) = self.doc.line_run_span(io.end + 1, grouping.end);
        let start_line = self.doc.line_of(span_start);
        let (start, _, removed) = self.doc.raw_remove_lines(io.end + 1, grouping.end);
        self.doc.markers_mut().reflow(io.end, io.end);
        let edit = Edit::delete(start, start_line, &removed);
        self.finish(pending, io.end, io.end, edit, Coalesce::Never)?;
        Ok(true)
    }

    /// Delete every gutter-selected run of lines, last run first.
    ///
    /// Each run is one undo record. If any run would leave an illegal seam,
    /// the runs already deleted are undone and the journal forgets them.
    pub fn delete_selected_slices(&mut self) -> Result<bool> {
        if let Some(line) = self.readline_line() {
            return Err(Error::ReadOnlyRegion { line });
        }
        let runs = slice::selection_slices(self.doc.markers());
        let Some(first) = runs.first().copied() else {
            return Ok(false);
        };
        let mark = self.journal.mark();
        for run in runs.iter().rev() {
            if let Err(e) = self.delete_line_run(*run) {
                self.journal.unwind_to(mark, &mut self.doc);
                return Err(e);
            }
        }
        self.doc.markers_mut().clear_selection();
        let line = first.start.min(self.doc.last_line());
        self.doc.set_caret(self.doc.line_start(line));
        Ok(true)
    }

    fn delete_line_run(&mut self, run: SliceRange) -> Result<()> {
        let opens_grouping = self.doc.markers_of(run.start).is_grouping_start();
        let pending = self.begin();
        let (span_start, _) = self.doc.line_run_span(run.start, run.end);
        let start_line = self.doc.line_of(span_start);
        let (start, _, removed) = self.doc.raw_remove_lines(run.start, run.end);

        let seam = run.start.min(self.doc.last_line());
        if opens_grouping && run.start < self.doc.line_count() {
            let kind = self.doc.kind_of(seam);
            self.doc.markers_mut().mark_grouping_start(seam, kind);
        }
        self.doc.markers_mut().reflow(seam, seam);
        let edit = Edit::delete(start, start_line, &removed);
        self.finish(pending, seam, seam, edit, Coalesce::Never)
    }

    /// Gutter click on `line`.
    ///
    /// Clicking a selected slice without `extend` toggles its fold and
    /// clears the selection. Otherwise the slice's selection flips; without
    /// `extend` every other slice is deselected first.
    pub fn margin_click(&mut self, line: usize, axis: Axis, extend: bool) -> Result<()> {
        let range = match axis {
            Axis::Grouping => self.doc.grouping_slice(line),
            Axis::Io => self.doc.io_slice(line),
        };
        let flag = axis.selecting_flag();
        let selected = self.doc.markers_of(range.start).contains(flag);
        if selected && !extend {
            self.toggle_fold(range.start, axis)?;
            self.unselect_all_slices();
            return Ok(());
        }
        if !extend {
            self.unselect_all_slices();
        }
        let markers = self.doc.markers_mut();
        for l in range.start..=range.end {
            if selected {
                markers.remove(l, flag);
            } else {
                markers.add(l, flag);
            }
        }
        Ok(())
    }

    /// Select every grouping in the gutter.
    pub fn select_all_slices(&mut self) {
        let markers = self.doc.markers_mut();
        for line in 0..markers.len() {
            markers.add(line, MarkerSet::GROUPING_SELECTING);
        }
    }

    pub fn unselect_all_slices(&mut self) {
        self.doc.markers_mut().clear_selection();
    }
}
