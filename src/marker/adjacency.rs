//! Allowed line-to-line marker transitions.

use super::set::MarkerSet;

/// The nine legal (I/O, grouping) combinations a line can carry.
///
/// "Start" includes the folded variants on both axes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Composite {
    InputStartGroupStart,
    InputMiddleGroupMiddle,
    InputEndGroupMiddle,
    InputEndGroupEnd,
    OutputStartGroupStart,
    OutputStartGroupMiddle,
    OutputStartGroupEnd,
    OutputMiddleGroupMiddle,
    OutputEndGroupEnd,
}

impl Composite {
    pub const ALL: [Self; 9] = [
        Self::InputStartGroupStart,
        Self::InputMiddleGroupMiddle,
        Self::InputEndGroupMiddle,
        Self::InputEndGroupEnd,
        Self::OutputStartGroupStart,
        Self::OutputStartGroupMiddle,
        Self::OutputStartGroupEnd,
        Self::OutputMiddleGroupMiddle,
        Self::OutputEndGroupEnd,
    ];

    /// Classify a marker set; `None` for combinations outside the nine.
    #[must_use]
    pub fn of(markers: MarkerSet) -> Option<Self> {
        let g_start = markers.intersects(MarkerSet::GROUP_ANY_START);
        let g_middle = markers.contains(MarkerSet::GROUP_MIDDLE);
        let g_end = markers.contains(MarkerSet::GROUP_END);

        if markers.intersects(MarkerSet::INPUT_START | MarkerSet::INPUT_START_FOLDED) {
            g_start.then_some(Self::InputStartGroupStart)
        } else if markers.contains(MarkerSet::INPUT_MIDDLE) {
            g_middle.then_some(Self::InputMiddleGroupMiddle)
        } else if markers.contains(MarkerSet::INPUT_END) {
            if g_middle {
                Some(Self::InputEndGroupMiddle)
            } else if g_end {
                Some(Self::InputEndGroupEnd)
            } else {
                None
            }
        } else if markers.intersects(MarkerSet::OUTPUT_START | MarkerSet::OUTPUT_START_FOLDED) {
            if g_start {
                Some(Self::OutputStartGroupStart)
            } else if g_middle {
                Some(Self::OutputStartGroupMiddle)
            } else if g_end {
                Some(Self::OutputStartGroupEnd)
            } else {
                None
            }
        } else if markers.contains(MarkerSet::OUTPUT_MIDDLE) {
            g_middle.then_some(Self::OutputMiddleGroupMiddle)
        } else if markers.contains(MarkerSet::OUTPUT_END) {
            g_end.then_some(Self::OutputEndGroupEnd)
        } else {
            None
        }
    }

    const fn index(self) -> usize {
        self as usize
    }
}

const T: bool = true;
const F: bool = false;

/// Rows: previous line. Columns: next line. Order follows [`Composite::ALL`].
const ALLOWED: [[bool; 9]; 9] = [
    [T, T, T, T, F, T, T, F, F],
    [F, T, T, T, F, F, F, F, F],
    [F, F, F, F, F, T, T, F, F],
    [T, F, F, F, T, F, F, F, F],
    [T, F, F, F, T, F, F, T, T],
    [F, F, F, F, F, F, F, T, T],
    [T, F, F, F, T, F, F, F, F],
    [F, F, F, F, F, F, F, T, T],
    [T, F, F, F, T, F, F, F, F],
];

/// Whether `next` may directly follow `prev`.
#[must_use]
pub fn allowed_adjacency(prev: MarkerSet, next: MarkerSet) -> bool {
    match (Composite::of(prev), Composite::of(next)) {
        (Some(p), Some(n)) => ALLOWED[p.index()][n.index()],
        _ => false,
    }
}
