//! Per-line marker bitset.

use bitflags::bitflags;

bitflags! {
    /// Markers attached to one line.
    ///
    /// Bit positions match the margin symbol numbers hosts have always used
    /// for slice shells, so a widget can map bit `n` to margin marker `n`.
    #[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
    pub struct MarkerSet: u32 {
        /// Line belongs to a grouping-slice selected in the gutter.
        const GROUPING_SELECTING   = 1 << 0;
        /// Line belongs to an I/O-slice selected in the gutter.
        const IO_SELECTING         = 1 << 1;

        const GROUP_START          = 1 << 2;
        const GROUP_START_FOLDED   = 1 << 3;
        const GROUP_MIDDLE         = 1 << 4;
        const GROUP_END            = 1 << 5;

        const INPUT_START          = 1 << 6;
        const INPUT_START_FOLDED   = 1 << 7;
        const INPUT_MIDDLE         = 1 << 8;
        const INPUT_END            = 1 << 9;

        const OUTPUT_START         = 1 << 10;
        const OUTPUT_START_FOLDED  = 1 << 11;
        const OUTPUT_MIDDLE        = 1 << 12;
        const OUTPUT_END           = 1 << 13;

        /// Visual tag carried by every output line.
        const OUTPUT_BACKGROUND    = 1 << 14;
        /// Visual tag of the line waiting for readline input.
        const READLINE_BACKGROUND  = 1 << 15;
        /// The line waiting for readline input.
        const INPUT_READLINE       = 1 << 16;
    }
}

impl MarkerSet {
    /// All grouping-axis markers.
    pub const GROUPING: Self = Self::GROUP_START
        .union(Self::GROUP_START_FOLDED)
        .union(Self::GROUP_MIDDLE)
        .union(Self::GROUP_END);
    /// All input markers.
    pub const INPUT: Self = Self::INPUT_START
        .union(Self::INPUT_START_FOLDED)
        .union(Self::INPUT_MIDDLE)
        .union(Self::INPUT_END);
    /// All output markers.
    pub const OUTPUT: Self = Self::OUTPUT_START
        .union(Self::OUTPUT_START_FOLDED)
        .union(Self::OUTPUT_MIDDLE)
        .union(Self::OUTPUT_END);
    /// All I/O-axis markers.
    pub const IO: Self = Self::INPUT.union(Self::OUTPUT);
    /// Grouping start markers, folded or not.
    pub const GROUP_ANY_START: Self = Self::GROUP_START.union(Self::GROUP_START_FOLDED);
    /// Unfolded I/O start markers.
    pub const IO_START: Self = Self::INPUT_START.union(Self::OUTPUT_START);
    /// Folded I/O start markers.
    pub const IO_START_FOLDED: Self = Self::INPUT_START_FOLDED.union(Self::OUTPUT_START_FOLDED);
    /// I/O start markers, folded or not.
    pub const IO_ANY_START: Self = Self::IO_START.union(Self::IO_START_FOLDED);
    /// I/O middle markers.
    pub const IO_MIDDLE: Self = Self::INPUT_MIDDLE.union(Self::OUTPUT_MIDDLE);
    /// I/O end markers.
    pub const IO_END: Self = Self::INPUT_END.union(Self::OUTPUT_END);
    /// Gutter selection flags.
    pub const SELECTING: Self = Self::GROUPING_SELECTING.union(Self::IO_SELECTING);
    /// Flags set only while a readline is pending.
    pub const READLINE: Self = Self::READLINE_BACKGROUND.union(Self::INPUT_READLINE);
    /// Every folded start marker.
    pub const FOLDED: Self = Self::GROUP_START_FOLDED.union(Self::IO_START_FOLDED);

    /// Markers of a line that continues the slice above it.
    #[must_use]
    pub fn continuation(kind: IoKind) -> Self {
        Self::GROUP_MIDDLE | kind.marker(IoRole::Middle)
    }

    /// Markers of a line that opens a new grouping with an I/O-slice of `kind`.
    #[must_use]
    pub fn grouping_start(kind: IoKind) -> Self {
        Self::GROUP_START | kind.marker(IoRole::Start)
    }

    /// Grouping marker, if exactly derivable by priority.
    #[must_use]
    pub fn grouping(self) -> Option<Grouping> {
        if self.contains(Self::GROUP_START) {
            Some(Grouping::Start)
        } else if self.contains(Self::GROUP_START_FOLDED) {
            Some(Grouping::StartFolded)
        } else if self.contains(Self::GROUP_MIDDLE) {
            Some(Grouping::Middle)
        } else if self.contains(Self::GROUP_END) {
            Some(Grouping::End)
        } else {
            None
        }
    }

    /// I/O kind, with input taking priority when both families are present.
    #[must_use]
    pub fn io_kind(self) -> Option<IoKind> {
        if self.intersects(Self::INPUT) {
            Some(IoKind::Input)
        } else if self.intersects(Self::OUTPUT) {
            Some(IoKind::Output)
        } else {
            None
        }
    }

    /// I/O marker as a (kind, role) pair, resolved by priority.
    #[must_use]
    pub fn io(self) -> Option<(IoKind, IoRole)> {
        let kind = self.io_kind()?;
        let role = IoRole::ALL
            .into_iter()
            .find(|role| self.contains(kind.marker(*role)))?;
        Some((kind, role))
    }

    /// Line opens a grouping-slice.
    #[must_use]
    pub fn is_grouping_start(self) -> bool {
        self.intersects(Self::GROUP_ANY_START)
    }

    /// Line opens an I/O-slice.
    #[must_use]
    pub fn is_io_start(self) -> bool {
        self.intersects(Self::IO_ANY_START)
    }

    /// Line is in the output family.
    #[must_use]
    pub fn is_output(self) -> bool {
        self.io_kind() == Some(IoKind::Output)
    }

    /// Line is in the input family.
    #[must_use]
    pub fn is_input(self) -> bool {
        self.io_kind() == Some(IoKind::Input)
    }

    /// Grouping start is folded.
    #[must_use]
    pub fn is_grouping_folded(self) -> bool {
        self.contains(Self::GROUP_START_FOLDED)
    }

    /// I/O start is folded.
    #[must_use]
    pub fn is_io_folded(self) -> bool {
        self.intersects(Self::IO_START_FOLDED)
    }

    /// Replace the grouping marker.
    #[must_use]
    pub fn with_grouping(self, grouping: Grouping) -> Self {
        (self - Self::GROUPING) | grouping.marker()
    }

    /// Replace the I/O marker.
    #[must_use]
    pub fn with_io(self, kind: IoKind, role: IoRole) -> Self {
        (self - Self::IO) | kind.marker(role)
    }

    /// Same markers with every folded start unfolded.
    #[must_use]
    pub fn unfolded(self) -> Self {
        let mut out = self - Self::FOLDED;
        if self.contains(Self::GROUP_START_FOLDED) {
            out |= Self::GROUP_START;
        }
        if self.contains(Self::INPUT_START_FOLDED) {
            out |= Self::INPUT_START;
        }
        if self.contains(Self::OUTPUT_START_FOLDED) {
            out |= Self::OUTPUT_START;
        }
        out
    }

    /// Keep one marker per axis by start-ness priority and derive the output background.
    ///
    /// Lines with no I/O marker at all are left without a background.
    #[must_use]
    pub fn normalized(self) -> Self {
        let mut out = self - Self::GROUPING - Self::IO - Self::OUTPUT_BACKGROUND;
        if let Some(grouping) = self.grouping() {
            out |= grouping.marker();
        }
        if let Some((kind, role)) = self.io() {
            out |= kind.marker(role);
            if kind == IoKind::Output {
                out |= Self::OUTPUT_BACKGROUND;
            }
        }
        out
    }

    /// Exactly one grouping marker and one I/O marker are present.
    #[must_use]
    pub fn is_single_per_axis(self) -> bool {
        (self & Self::GROUPING).bits().count_ones() == 1 && (self & Self::IO).bits().count_ones() == 1
    }
}

/// Type of an I/O-slice.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IoKind {
    Input,
    Output,
}

impl IoKind {
    /// Marker for this kind in the given role.
    #[must_use]
    pub const fn marker(self, role: IoRole) -> MarkerSet {
        match (self, role) {
            (Self::Input, IoRole::Start) => MarkerSet::INPUT_START,
            (Self::Input, IoRole::StartFolded) => MarkerSet::INPUT_START_FOLDED,
            (Self::Input, IoRole::Middle) => MarkerSet::INPUT_MIDDLE,
            (Self::Input, IoRole::End) => MarkerSet::INPUT_END,
            (Self::Output, IoRole::Start) => MarkerSet::OUTPUT_START,
            (Self::Output, IoRole::StartFolded) => MarkerSet::OUTPUT_START_FOLDED,
            (Self::Output, IoRole::Middle) => MarkerSet::OUTPUT_MIDDLE,
            (Self::Output, IoRole::End) => MarkerSet::OUTPUT_END,
        }
    }

    /// The other kind.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Input => Self::Output,
            Self::Output => Self::Input,
        }
    }
}

/// Grouping-axis marker, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Grouping {
    Start,
    StartFolded,
    Middle,
    End,
}

impl Grouping {
    #[must_use]
    pub const fn marker(self) -> MarkerSet {
        match self {
            Self::Start => MarkerSet::GROUP_START,
            Self::StartFolded => MarkerSet::GROUP_START_FOLDED,
            Self::Middle => MarkerSet::GROUP_MIDDLE,
            Self::End => MarkerSet::GROUP_END,
        }
    }
}

/// Role of a line inside its I/O-slice, in priority order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IoRole {
    Start,
    StartFolded,
    Middle,
    End,
}

impl IoRole {
    pub const ALL: [Self; 4] = [Self::Start, Self::StartFolded, Self::Middle, Self::End];

    /// Start or folded start.
    #[must_use]
    pub const fn is_start(self) -> bool {
        matches!(self, Self::Start | Self::StartFolded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bit_positions_follow_margin_numbers() {
        assert_eq!(MarkerSet::GROUP_START.bits(), 1 << 2);
        assert_eq!(MarkerSet::INPUT_START.bits(), 1 << 6);
        assert_eq!(MarkerSet::OUTPUT_START.bits(), 1 << 10);
        assert_eq!(MarkerSet::INPUT_READLINE.bits(), 1 << 16);
    }

    #[test]
    fn normalize_keeps_highest_start_ness() {
        let raw = MarkerSet::GROUP_END | MarkerSet::GROUP_MIDDLE | MarkerSet::INPUT_END | MarkerSet::INPUT_START_FOLDED;
        let norm = raw.normalized();
        assert_eq!(norm, MarkerSet::GROUP_MIDDLE | MarkerSet::INPUT_START_FOLDED);

        let raw = MarkerSet::GROUP_START_FOLDED | MarkerSet::GROUP_START | MarkerSet::OUTPUT_MIDDLE;
        assert_eq!(
            raw.normalized(),
            MarkerSet::GROUP_START | MarkerSet::OUTPUT_MIDDLE | MarkerSet::OUTPUT_BACKGROUND
        );
    }

    #[test]
    fn normalize_prefers_input_family() {
        let raw = MarkerSet::GROUP_MIDDLE | MarkerSet::OUTPUT_START | MarkerSet::INPUT_END | MarkerSet::OUTPUT_BACKGROUND;
        assert_eq!(raw.normalized(), MarkerSet::GROUP_MIDDLE | MarkerSet::INPUT_END);
    }

    #[test]
    fn normalize_keeps_orthogonal_flags() {
        let raw = MarkerSet::GROUP_START | MarkerSet::INPUT_START | MarkerSet::READLINE | MarkerSet::IO_SELECTING;
        assert_eq!(raw.normalized(), raw);
    }

    #[test]
    fn io_pair_resolution() {
        let m = MarkerSet::continuation(IoKind::Output);
        assert_eq!(m.io(), Some((IoKind::Output, IoRole::Middle)));
        assert_eq!(m.grouping(), Some(Grouping::Middle));
        assert!(m.is_output());
        assert!(!m.is_io_start());
        assert_eq!(MarkerSet::empty().io(), None);
    }

    #[test]
    fn unfolded_restores_plain_starts() {
        let folded = MarkerSet::GROUP_START_FOLDED | MarkerSet::INPUT_START_FOLDED;
        assert_eq!(folded.unfolded(), MarkerSet::GROUP_START | MarkerSet::INPUT_START);
        assert!(folded.is_grouping_folded());
        assert!(folded.is_io_folded());
    }

    #[test]
    fn single_per_axis() {
        assert!(MarkerSet::grouping_start(IoKind::Input).is_single_per_axis());
        assert!(!(MarkerSet::GROUP_START | MarkerSet::GROUP_END | MarkerSet::INPUT_END).is_single_per_axis());
        assert!(!MarkerSet::GROUP_START.is_single_per_axis());
    }
}
