//! Marker array kept parallel to the lines of the text buffer.

use super::adjacency::allowed_adjacency;
use super::set::{Grouping, IoKind, IoRole, MarkerSet};

/// Per-line marker sets, indexed by line number.
///
/// Start markers (plain or folded) are the structural data of a document:
/// they say where grouping-slices and I/O-slices begin and which kind each
/// I/O-slice is. `Middle` and `End` markers and the output background are
/// derived from them by [`reflow`](Self::reflow), which every mutating
/// primitive runs over the lines it touched.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MarkerStore {
    lines: Vec<MarkerSet>,
}

impl Default for MarkerStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MarkerStore {
    /// A store for a one-line document holding an empty input slice.
    #[must_use]
    pub fn new() -> Self {
        Self {
            lines: vec![MarkerSet::grouping_start(IoKind::Input)],
        }
    }

    /// Build a store from raw sets, then derive every marker.
    #[must_use]
    pub fn from_sets(sets: Vec<MarkerSet>) -> Self {
        let mut store = Self { lines: sets };
        if store.lines.is_empty() {
            store.lines.push(MarkerSet::grouping_start(IoKind::Input));
        }
        store.reflow_all();
        store
    }

    /// Number of lines tracked.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Markers of `line`; empty for lines past the end.
    #[must_use]
    pub fn markers_of(&self, line: usize) -> MarkerSet {
        self.lines.get(line).copied().unwrap_or_default()
    }

    /// Iterate over the marker sets in line order.
    pub fn iter(&self) -> impl Iterator<Item = MarkerSet> + '_ {
        self.lines.iter().copied()
    }

    /// Replace the markers of `line`, then normalize it.
    ///
    /// # Panics
    ///
    /// Panics if `line` is out of range.
    pub fn set_markers(&mut self, line: usize, markers: MarkerSet) {
        assert!(line < self.lines.len(), "marker line {line} out of range");
        self.lines[line] = markers;
        self.normalize(line);
    }

    /// Keep one marker per axis on `line` and derive its output background.
    ///
    /// # Panics
    ///
    /// Panics if `line` is out of range.
    pub fn normalize(&mut self, line: usize) {
        assert!(line < self.lines.len(), "marker line {line} out of range");
        self.lines[line] = self.lines[line].normalized();
    }

    pub(crate) fn set_raw(&mut self, line: usize, markers: MarkerSet) {
        if let Some(slot) = self.lines.get_mut(line) {
            *slot = markers;
        }
    }

    pub(crate) fn add(&mut self, line: usize, flags: MarkerSet) {
        if let Some(slot) = self.lines.get_mut(line) {
            slot.insert(flags);
        }
    }

    pub(crate) fn remove(&mut self, line: usize, flags: MarkerSet) {
        if let Some(slot) = self.lines.get_mut(line) {
            slot.remove(flags);
        }
    }

    /// Make `line` open a new grouping with an I/O-slice of `kind`.
    pub(crate) fn mark_grouping_start(&mut self, line: usize, kind: IoKind) {
        let keep = self.markers_of(line) & (MarkerSet::SELECTING | MarkerSet::READLINE);
        self.set_raw(line, keep | MarkerSet::grouping_start(kind));
    }

    /// Make `line` open a new I/O-slice of `kind` inside the current grouping.
    pub(crate) fn mark_io_start(&mut self, line: usize, kind: IoKind) {
        let keep = self.markers_of(line) & (MarkerSet::SELECTING | MarkerSet::READLINE);
        self.set_raw(line, keep | MarkerSet::GROUP_MIDDLE | kind.marker(IoRole::Start));
    }

    /// Make `line` continue the slice above it.
    pub(crate) fn mark_continuation(&mut self, line: usize, kind: IoKind) {
        let keep = self.markers_of(line) & (MarkerSet::SELECTING | MarkerSet::READLINE);
        self.set_raw(line, keep | MarkerSet::continuation(kind));
    }

    /// Insert `count` lines carrying `markers` right after `line`.
    pub(crate) fn insert_lines(&mut self, line: usize, count: usize, markers: MarkerSet) {
        let at = (line + 1).min(self.lines.len());
        self.lines
            .splice(at..at, std::iter::repeat_n(markers, count));
    }

    /// Remove lines `first..=last`.
    pub(crate) fn remove_lines(&mut self, first: usize, last: usize) {
        if first > last || first >= self.lines.len() {
            return;
        }
        let last = last.min(self.lines.len() - 1);
        self.lines.drain(first..=last);
        if self.lines.is_empty() {
            self.lines.push(MarkerSet::grouping_start(IoKind::Input));
        }
    }

    /// Replace every line with a single empty input slice.
    pub(crate) fn reset(&mut self, line_count: usize) {
        self.lines.clear();
        self.lines.push(MarkerSet::grouping_start(IoKind::Input));
        self.lines
            .extend(std::iter::repeat_n(MarkerSet::continuation(IoKind::Input), line_count.saturating_sub(1)));
        self.reflow_all();
    }

    /// Re-derive `Middle`/`End` markers and backgrounds from the start markers.
    ///
    /// Covers `from - 1 ..= to` and keeps going past `to` while derived
    /// markers still change, so kind changes propagate to the end of their
    /// slice.
    pub fn reflow(&mut self, from: usize, to: usize) {
        let n = self.lines.len();
        if n == 0 {
            return;
        }
        let lo = from.saturating_sub(1).min(n - 1);
        let hi = to.min(n - 1);
        let mut prev_kind = if lo == 0 {
            None
        } else {
            self.lines[lo - 1].io_kind()
        };
        for i in lo..n {
            let current = self.lines[i];
            let derived = self.derive(i, current, prev_kind);
            self.lines[i] = derived;
            prev_kind = derived.io_kind();
            if i > hi && derived == current {
                break;
            }
        }
    }

    /// Re-derive every line.
    pub fn reflow_all(&mut self) {
        let n = self.lines.len();
        self.reflow(0, n.saturating_sub(1));
    }

    fn derive(&self, line: usize, current: MarkerSet, prev_kind: Option<IoKind>) -> MarkerSet {
        let grouping_start = line == 0 || prev_kind.is_none() || current.is_grouping_start();
        let io_start = grouping_start || current.is_io_start();
        let kind = if io_start {
            current.io_kind().unwrap_or(IoKind::Input)
        } else {
            prev_kind.unwrap_or(IoKind::Input)
        };

        let next = self.lines.get(line + 1).copied();
        let next_grouping_start = next.is_none_or(MarkerSet::is_grouping_start);
        let next_io_start = next.is_none_or(|m| m.is_grouping_start() || m.is_io_start());

        let grouping = if grouping_start {
            if current.is_grouping_folded() {
                Grouping::StartFolded
            } else {
                Grouping::Start
            }
        } else if next_grouping_start {
            Grouping::End
        } else {
            Grouping::Middle
        };
        let role = if io_start {
            if current.is_io_folded() {
                IoRole::StartFolded
            } else {
                IoRole::Start
            }
        } else if next_io_start {
            IoRole::End
        } else {
            IoRole::Middle
        };

        let mut out = (current & (MarkerSet::SELECTING | MarkerSet::READLINE))
            | grouping.marker()
            | kind.marker(role);
        if kind == IoKind::Output {
            out |= MarkerSet::OUTPUT_BACKGROUND;
        }
        out
    }

    /// Ensure line 0 opens a grouping and an I/O-slice. Returns whether anything changed.
    pub fn restore_first_marker(&mut self) -> bool {
        let Some(first) = self.lines.first().copied() else {
            self.lines.push(MarkerSet::grouping_start(IoKind::Input));
            return true;
        };
        if first.is_grouping_start() && first.is_io_start() && first.is_single_per_axis() {
            return false;
        }
        let kind = first.io_kind().unwrap_or(IoKind::Input);
        self.mark_grouping_start(0, kind);
        self.reflow(0, 0);
        true
    }

    /// First line in `lo..=hi + 1` whose pairing with the line above is not allowed.
    ///
    /// Pairs touching a pending readline line are skipped: that line is
    /// transiently typed as input inside a running grouping.
    #[must_use]
    pub fn first_illegal_pair(&self, lo: usize, hi: usize) -> Option<usize> {
        let n = self.lines.len();
        let start = lo.max(1);
        let end = (hi + 1).min(n.saturating_sub(1));
        (start..=end).find(|&i| {
            let prev = self.lines[i - 1];
            let next = self.lines[i];
            if prev.intersects(MarkerSet::INPUT_READLINE) || next.intersects(MarkerSet::INPUT_READLINE) {
                return false;
            }
            !allowed_adjacency(prev, next)
        })
    }

    /// First line breaking a document invariant, if any.
    #[must_use]
    pub fn first_invalid_line(&self) -> Option<usize> {
        let first = self.lines.first()?;
        if !(first.is_grouping_start() && first.is_io_start()) {
            return Some(0);
        }
        for (i, m) in self.lines.iter().enumerate() {
            if !m.is_single_per_axis() {
                return Some(i);
            }
            if m.is_output() != m.contains(MarkerSet::OUTPUT_BACKGROUND) {
                return Some(i);
            }
        }
        let last = self.lines.len() - 1;
        let tail = self.lines[last];
        if !(tail.contains(MarkerSet::GROUP_END) || tail.is_grouping_start()) {
            return Some(last);
        }
        self.first_illegal_pair(0, last)
    }

    /// Capture lines `first..=last`, without gutter selection flags.
    #[must_use]
    pub fn snapshot(&self, first: usize, last: usize) -> MarkerSnapshot {
        let n = self.lines.len();
        if n == 0 || first >= n {
            return MarkerSnapshot {
                first_line: first,
                sets: Vec::new(),
            };
        }
        let last = last.min(n - 1);
        MarkerSnapshot {
            first_line: first,
            sets: self.lines[first..=last]
                .iter()
                .map(|m| *m - MarkerSet::SELECTING)
                .collect(),
        }
    }

    /// Write a snapshot back over the lines it covers.
    pub fn restore(&mut self, snapshot: &MarkerSnapshot) {
        for (offset, set) in snapshot.sets.iter().enumerate() {
            let line = snapshot.first_line + offset;
            if let Some(slot) = self.lines.get_mut(line) {
                *slot = *set | (*slot & MarkerSet::SELECTING);
            }
        }
    }

    /// Clear the gutter selection flags from every line.
    pub fn clear_selection(&mut self) {
        for m in &mut self.lines {
            m.remove(MarkerSet::SELECTING);
        }
    }

    /// Lines carrying any gutter selection flag.
    #[must_use]
    pub fn is_any_selected(&self) -> bool {
        self.lines.iter().any(|m| m.intersects(MarkerSet::SELECTING))
    }
}

/// Contiguous copy of marker sets, tagged with the first line it covers.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MarkerSnapshot {
    first_line: usize,
    sets: Vec<MarkerSet>,
}

impl MarkerSnapshot {
    /// Build a snapshot from explicit sets.
    #[must_use]
    pub fn new(first_line: usize, sets: Vec<MarkerSet>) -> Self {
        Self { first_line, sets }
    }

    #[must_use]
    pub fn first_line(&self) -> usize {
        self.first_line
    }

    #[must_use]
    pub fn sets(&self) -> &[MarkerSet] {
        &self.sets
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sets.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sets.is_empty()
    }
}
