//! # Physical, Virtual and Frame-Number Address Types
//!
//! Strongly typed wrappers for the three coordinate systems a physical page
//! allocator moves between.
//!
//! | Type | Meaning |
//! |------|---------|
//! | [`PhysicalAddress`] | A byte address in physical memory. |
//! | [`VirtualAddress`] | A byte address in the kernel's (direct-mapped) virtual address space. |
//! | [`PageFrameNumber`] | The index of a page frame: physical address `>> PAGE_SHIFT`. |
//! | [`PhysicalRange`] | A half-open `[start, end)` physical byte range. |
//!
//! All types are `#[repr(transparent)]` (or plain pairs of them), `Copy`, and
//! ordered, so they can be compared and sorted without unwrapping.
//!
//! ## Frame Conversions
//!
//! ```text
//!   PhysicalAddress ──phys_to_pfn (round down)──► PageFrameNumber
//!                   ──phys_to_pfn_up (round up)─►
//!   PageFrameNumber ──pfn_to_phys──────────────► PhysicalAddress
//! ```
//!
//! Rounding *up* is used for the start of a free range and rounding *down*
//! for its end, so a carved range never includes a partially usable frame.
//!
//! ## Buddy Identities
//!
//! For an order-`n` block starting at frame `F`:
//!
//! - its buddy starts at `F ^ (1 << n)` ([`PageFrameNumber::buddy`]),
//! - the merged order-`n + 1` block starts at `F & !(1 << n)`
//!   ([`PageFrameNumber::parent`]), which equals `F & buddy(F)`.
//!
//! ```rust
//! # use kernel_memory_addresses::*;
//! let f = PageFrameNumber::new(12);
//! assert_eq!(f.buddy(1), PageFrameNumber::new(14));
//! assert_eq!(f.parent(1), PageFrameNumber::new(12));
//! assert_eq!(PageFrameNumber::new(14).parent(1), PageFrameNumber::new(12));
//! ```
//!
//! Translation between physical and virtual addresses is not done here; it
//! depends on how the kernel maps physical memory and lives behind a mapper
//! trait in the allocator.

#![cfg_attr(not(any(test, doctest)), no_std)]
#![allow(clippy::inline_always)]

mod page_frame_number;
mod physical_address;
mod physical_range;
mod virtual_address;

pub use kernel_info::memory::{PAGE_SHIFT, PAGE_SIZE};
pub use page_frame_number::PageFrameNumber;
pub use physical_address::PhysicalAddress;
pub use physical_range::PhysicalRange;
pub use virtual_address::VirtualAddress;

/// Frame containing `pa` (rounds down).
#[inline]
#[must_use]
pub const fn phys_to_pfn(pa: PhysicalAddress) -> PageFrameNumber {
    PageFrameNumber::new(pa.as_u64() >> PAGE_SHIFT)
}

/// First physical byte of frame `pfn`.
#[inline]
#[must_use]
pub const fn pfn_to_phys(pfn: PageFrameNumber) -> PhysicalAddress {
    PhysicalAddress::new(pfn.as_u64() << PAGE_SHIFT)
}

/// First frame that starts at or after `pa`.
#[inline]
#[must_use]
pub const fn phys_to_pfn_up(pa: PhysicalAddress) -> PageFrameNumber {
    PageFrameNumber::new((pa.as_u64() + (PAGE_SIZE - 1)) >> PAGE_SHIFT)
}

/// Frame that ends a range whose exclusive end is `pa`.
///
/// Identical to [`phys_to_pfn`]; the separate name documents which end of a
/// range is being converted.
#[inline]
#[must_use]
pub const fn phys_to_pfn_down(pa: PhysicalAddress) -> PageFrameNumber {
    phys_to_pfn(pa)
}
