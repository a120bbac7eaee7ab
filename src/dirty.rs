//! Tracking of the framebuffer bytes that still have to reach the panel.
//!
//! Between two flushes every touched byte offset is folded into one
//! contiguous [`DirtyRange`]. The sync engine sends that range in a single
//! data burst, so the range only ever grows until the flush collapses it.
//!
//! A rectangular [`DirtyArea`] can also be recorded. It is reserved for
//! partial window updates and has no synchronization strategy yet; the
//! combination of both kinds stays an explicit, unresolved state.

use core::ops::Range;

/// Half-open byte interval `[start, end)` over the pixel buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirtyRange {
    start: usize,
    end: usize,
}

impl DirtyRange {
    /// Create a range covering `start..end`.
    ///
    /// The bounds are swapped if given in reverse order.
    #[must_use]
    pub const fn new(start: usize, end: usize) -> Self {
        if start <= end {
            Self { start, end }
        } else {
            Self {
                start: end,
                end: start,
            }
        }
    }

    /// Zero length range anchored at `at`.
    #[must_use]
    pub const fn empty_at(at: usize) -> Self {
        Self { start: at, end: at }
    }

    /// First dirty offset.
    #[must_use]
    pub const fn start(&self) -> usize {
        self.start
    }

    /// One past the last dirty offset.
    #[must_use]
    pub const fn end(&self) -> usize {
        self.end
    }

    /// Number of bytes covered.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.end - self.start
    }

    /// `true` when the range covers no bytes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// The range as a slice index.
    #[must_use]
    pub const fn as_range(&self) -> Range<usize> {
        self.start..self.end
    }

    /// Extend both bounds so that `pos` lies within `[start, end]`.
    ///
    /// This is what a cursor move does: the new position may become the
    /// start or the end of the pending transmission.
    pub fn include(&mut self, pos: usize) {
        self.start = self.start.min(pos);
        self.end = self.end.max(pos);
    }

    /// Raise the end bound to `end` if it is further out.
    pub fn extend_to(&mut self, end: usize) {
        self.end = self.end.max(end);
    }

    /// Grow to cover all of `other`.
    pub fn union(&mut self, other: Range<usize>) {
        if other.is_empty() {
            return;
        }
        self.start = self.start.min(other.start);
        self.end = self.end.max(other.end);
    }
}

impl From<Range<usize>> for DirtyRange {
    fn from(range: Range<usize>) -> Self {
        Self::new(range.start, range.end)
    }
}

/// Rectangle of chunks, in chunk coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DirtyArea {
    /// Left column
    pub x: u8,
    /// Top chunk row
    pub y: u8,
    /// Width in chunk columns
    pub width: u8,
    /// Height in chunk rows
    pub height: u8,
}

impl DirtyArea {
    /// Smallest rectangle containing both `self` and `other`.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = (self.x + self.width).max(other.x + other.width);
        let bottom = (self.y + self.height).max(other.y + other.height);
        Self {
            x,
            y,
            width: right - x,
            height: bottom - y,
        }
    }
}

/// Which kinds of change are pending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DirtyKind {
    /// Nothing to send
    None,
    /// A contiguous byte range
    Range,
    /// A rectangular chunk area
    Area,
    /// Both a range and an area
    RangeAndArea,
}

/// Synchronization state derived from the pending changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SyncState {
    /// The panel already shows the framebuffer contents.
    Idle,
    /// A contiguous range is waiting to be sent.
    RangeDirty(DirtyRange),
    /// Only a rectangular area is pending.
    AreaDirty(DirtyArea),
    /// Both kinds are pending. There is no merge policy for this yet.
    BothDirty {
        /// Pending byte range
        range: DirtyRange,
        /// Pending rectangular area
        area: DirtyArea,
    },
}

impl SyncState {
    /// The kind of change this state represents.
    #[must_use]
    pub const fn kind(&self) -> DirtyKind {
        match self {
            SyncState::Idle => DirtyKind::None,
            SyncState::RangeDirty(_) => DirtyKind::Range,
            SyncState::AreaDirty(_) => DirtyKind::Area,
            SyncState::BothDirty { .. } => DirtyKind::RangeAndArea,
        }
    }
}

/// Pending change bookkeeping owned by the framebuffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub(crate) struct DirtyTracker {
    pub(crate) range: DirtyRange,
    pub(crate) range_pending: bool,
    pub(crate) area: Option<DirtyArea>,
}

impl DirtyTracker {
    pub(crate) fn state(&self) -> SyncState {
        match (self.range_pending, self.area) {
            (false, None) => SyncState::Idle,
            (true, None) => SyncState::RangeDirty(self.range),
            (false, Some(area)) => SyncState::AreaDirty(area),
            (true, Some(area)) => SyncState::BothDirty {
                range: self.range,
                area,
            },
        }
    }

    /// Mark the whole buffer of `size` bytes as pending.
    ///
    /// A full range supersedes any pending area.
    pub(crate) fn mark_all(&mut self, size: usize) {
        self.range = DirtyRange::new(0, size);
        self.range_pending = true;
        self.area = None;
    }

    pub(crate) fn mark_area(&mut self, area: DirtyArea) {
        self.area = Some(match self.area {
            Some(pending) => pending.union(area),
            None => area,
        });
    }

    /// Collapse the range after it was transmitted.
    pub(crate) fn range_sent(&mut self, size: usize) {
        let anchor = self.range.end() % size;
        self.range = DirtyRange::empty_at(anchor);
        self.range_pending = false;
    }
}
