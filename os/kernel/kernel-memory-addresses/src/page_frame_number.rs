use crate::{PhysicalAddress, pfn_to_phys};
use core::fmt;
use core::ops::{Add, AddAssign};

/// Page frame number: a physical address divided by the page size.
///
/// Buddy arithmetic operates on frame numbers only; addresses are derived at
/// the edges via [`base`](Self::base).
#[repr(transparent)]
#[derive(Copy, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PageFrameNumber(u64);

impl PageFrameNumber {
    #[inline]
    #[must_use]
    pub const fn new(v: u64) -> Self {
        Self(v)
    }

    #[inline]
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// First physical byte of this frame.
    #[inline]
    #[must_use]
    pub const fn base(self) -> PhysicalAddress {
        pfn_to_phys(self)
    }

    /// Whether this frame can start an order-`order` block.
    #[inline]
    #[must_use]
    pub const fn is_aligned(self, order: usize) -> bool {
        self.0 & ((1 << order) - 1) == 0
    }

    /// Start of the order-`order` buddy of the block starting here.
    #[inline]
    #[must_use]
    pub const fn buddy(self, order: usize) -> Self {
        Self(self.0 ^ (1 << order))
    }

    /// Start of the order-`order + 1` block formed by this block and its buddy.
    #[inline]
    #[must_use]
    pub const fn parent(self, order: usize) -> Self {
        Self(self.0 & !(1 << order))
    }

    /// Number of frames from `origin` up to `self`, or `None` if `self` lies below.
    #[inline]
    #[must_use]
    pub const fn distance_from(self, origin: Self) -> Option<u64> {
        self.0.checked_sub(origin.0)
    }
}

impl fmt::Debug for PageFrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PFN({:#x})", self.0)
    }
}

impl fmt::Display for PageFrameNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl From<u64> for PageFrameNumber {
    #[inline]
    fn from(v: u64) -> Self {
        Self::new(v)
    }
}

impl Add<u64> for PageFrameNumber {
    type Output = Self;
    #[inline]
    fn add(self, rhs: u64) -> Self::Output {
        Self(self.0 + rhs)
    }
}

impl AddAssign<u64> for PageFrameNumber {
    #[inline]
    fn add_assign(&mut self, rhs: u64) {
        self.0 += rhs;
    }
}
