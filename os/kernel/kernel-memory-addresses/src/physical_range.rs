use crate::{PageFrameNumber, PhysicalAddress, phys_to_pfn_down, phys_to_pfn_up};
use core::fmt;

/// Half-open physical byte range `[start, end)`.
///
/// Ranges reported by firmware need not be page aligned; use
/// [`frames`](Self::frames) to get the whole frames they contain.
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PhysicalRange {
    pub start: PhysicalAddress,
    pub end: PhysicalAddress,
}

impl PhysicalRange {
    #[inline]
    #[must_use]
    pub const fn new(start: PhysicalAddress, end: PhysicalAddress) -> Self {
        Self { start, end }
    }

    /// Build a range from a `(base, size)` pair as region providers report them.
    #[inline]
    #[must_use]
    pub const fn from_base_size(base: u64, size: u64) -> Self {
        Self::new(PhysicalAddress::new(base), PhysicalAddress::new(base + size))
    }

    /// Range covering the frames `[start, end)`.
    #[inline]
    #[must_use]
    pub const fn from_frames(start: PageFrameNumber, end: PageFrameNumber) -> Self {
        Self::new(start.base(), end.base())
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.end.as_u64() <= self.start.as_u64()
    }

    #[inline]
    #[must_use]
    pub const fn contains(self, pa: PhysicalAddress) -> bool {
        self.start.as_u64() <= pa.as_u64() && pa.as_u64() < self.end.as_u64()
    }

    /// Whole frames inside the range: start rounded up, end rounded down.
    ///
    /// The returned pair is empty (`start >= end`) when the range does not
    /// contain a single complete frame.
    #[inline]
    #[must_use]
    pub const fn frames(self) -> (PageFrameNumber, PageFrameNumber) {
        (phys_to_pfn_up(self.start), phys_to_pfn_down(self.end))
    }

    /// Number of whole frames inside the range.
    #[inline]
    #[must_use]
    pub const fn pages(self) -> u64 {
        let (start, end) = self.frames();
        end.as_u64().saturating_sub(start.as_u64())
    }

    /// Overlap of two ranges; empty ranges collapse to `None`.
    #[must_use]
    pub fn intersect(self, other: Self) -> Option<Self> {
        let r = Self::new(self.start.max(other.start), self.end.min(other.end));
        (!r.is_empty()).then_some(r)
    }
}

impl fmt::Debug for PhysicalRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PhysicalRange[{}..{})", self.start, self.end)
    }
}

impl fmt::Display for PhysicalRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end)
    }
}
