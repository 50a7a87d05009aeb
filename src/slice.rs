//! Slice queries over the marker store.
//!
//! All functions here are pure: they read markers and never change them.

use crate::marker::{IoKind, MarkerSet, MarkerStore};

/// Inclusive line range of a slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SliceRange {
    pub start: usize,
    pub end: usize,
}

impl SliceRange {
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Number of lines covered.
    #[must_use]
    pub const fn len(self) -> usize {
        self.end + 1 - self.start
    }

    /// A range always covers at least one line.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        false
    }

    #[must_use]
    pub const fn contains(self, line: usize) -> bool {
        self.start <= line && line <= self.end
    }
}

/// Gutter axis a selection or fold applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    Grouping,
    Io,
}

impl Axis {
    #[must_use]
    pub const fn selecting_flag(self) -> MarkerSet {
        match self {
            Self::Grouping => MarkerSet::GROUPING_SELECTING,
            Self::Io => MarkerSet::IO_SELECTING,
        }
    }
}

/// Gutter-selected I/O lines, all of one kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IoSelection {
    pub range: SliceRange,
    pub kind: IoKind,
}

fn scan(
    markers: &MarkerStore,
    line: usize,
    is_start: impl Fn(MarkerSet) -> bool,
    end_flag: MarkerSet,
) -> SliceRange {
    let n = markers.len();
    if n == 0 {
        return SliceRange::new(0, 0);
    }
    let line = line.min(n - 1);
    let start = (0..=line)
        .rev()
        .find(|&i| is_start(markers.markers_of(i)))
        .unwrap_or(0);
    let mut end = n - 1;
    for i in line..n {
        let m = markers.markers_of(i);
        if m.intersects(end_flag) {
            end = i;
            break;
        }
        if i > line && is_start(m) {
            end = i - 1;
            break;
        }
    }
    SliceRange::new(start, end)
}

/// Grouping-slice containing `line`.
///
/// Scans back to the nearest grouping start and forward to the nearest
/// grouping end; a new start closes the slice on the line before it.
#[must_use]
pub fn grouping_slice(markers: &MarkerStore, line: usize) -> SliceRange {
    scan(markers, line, MarkerSet::is_grouping_start, MarkerSet::GROUP_END)
}

/// I/O-slice containing `line`.
#[must_use]
pub fn io_slice(markers: &MarkerStore, line: usize) -> SliceRange {
    scan(
        markers,
        line,
        |m| m.is_io_start() || m.is_grouping_start(),
        MarkerSet::IO_END,
    )
}

/// First contiguous run of I/O-selected lines, cut at the first kind change.
#[must_use]
pub fn io_selection(markers: &MarkerStore) -> Option<IoSelection> {
    let n = markers.len();
    let start = (0..n).find(|&i| markers.markers_of(i).contains(MarkerSet::IO_SELECTING))?;
    let kind = markers.markers_of(start).io_kind().unwrap_or(IoKind::Input);
    let mut end = start;
    for i in start + 1..n {
        let m = markers.markers_of(i);
        if !m.contains(MarkerSet::IO_SELECTING) || m.io_kind() != Some(kind) {
            break;
        }
        end = i;
    }
    Some(IoSelection {
        range: SliceRange::new(start, end),
        kind,
    })
}

/// Whether any line is gutter-selected.
#[must_use]
pub fn is_any_selected(markers: &MarkerStore) -> bool {
    markers.is_any_selected()
}

/// Contiguous runs of gutter-selected lines, on either axis.
#[must_use]
pub fn selection_slices(markers: &MarkerStore) -> Vec<SliceRange> {
    let mut runs = Vec::new();
    let mut current: Option<usize> = None;
    for (i, m) in markers.iter().enumerate() {
        match (m.intersects(MarkerSet::SELECTING), current) {
            (true, None) => current = Some(i),
            (false, Some(start)) => {
                runs.push(SliceRange::new(start, i - 1));
                current = None;
            }
            _ => {}
        }
    }
    if let Some(start) = current {
        runs.push(SliceRange::new(start, markers.len() - 1));
    }
    runs
}

/// Every grouping-slice in document order.
#[must_use]
pub fn groupings(markers: &MarkerStore) -> Vec<SliceRange> {
    let mut out = Vec::new();
    let mut line = 0;
    while line < markers.len() {
        let range = grouping_slice(markers, line);
        out.push(range);
        line = range.end + 1;
    }
    out
}

/// Every I/O-slice in document order, with its kind.
#[must_use]
pub fn io_slices(markers: &MarkerStore) -> Vec<(SliceRange, IoKind)> {
    let mut out = Vec::new();
    let mut line = 0;
    while line < markers.len() {
        let range = io_slice(markers, line);
        let kind = markers.markers_of(range.start).io_kind().unwrap_or(IoKind::Input);
        out.push((range, kind));
        line = range.end + 1;
    }
    out
}

/// A line is hidden when it lies strictly inside a folded grouping or a folded I/O-slice.
#[must_use]
pub fn is_visible(markers: &MarkerStore, line: usize) -> bool {
    let grouping = grouping_slice(markers, line);
    if grouping.start != line && markers.markers_of(grouping.start).is_grouping_folded() {
        return false;
    }
    let io = io_slice(markers, line);
    !(io.start != line && markers.markers_of(io.start).is_io_folded())
}
