//! # Page Metadata Record
//!
//! One [`PageRecord`] exists per physical frame. A record is in exactly one
//! [`PageState`] at a time; the order, head back-reference and list link that
//! older designs overlay in shared storage are kept in the variant they
//! belong to, so a stale field can never be read in the wrong state.

use crate::page_flags::{MigrateType, PageFlags, ZoneType};
use kernel_memory_addresses::PageFrameNumber;

/// What a frame is currently used for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PageState {
    /// Owned by a caller, or an interior frame of a free block.
    #[default]
    Allocated,
    /// First frame of a free order-`order` block on a free list.
    Free { order: usize },
    /// First frame of a compound run of `2^order` frames.
    CompoundHead { order: usize },
    /// Non-first frame of a compound run whose head is `head`.
    CompoundTail { head: PageFrameNumber },
}

/// Node of the intrusive free list threaded through the page records.
///
/// An unlinked node has neither neighbor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ListLink {
    pub(crate) prev: Option<PageFrameNumber>,
    pub(crate) next: Option<PageFrameNumber>,
}

impl ListLink {
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            prev: None,
            next: None,
        }
    }

    #[must_use]
    pub const fn is_unlinked(&self) -> bool {
        self.prev.is_none() && self.next.is_none()
    }

    #[must_use]
    pub const fn next(&self) -> Option<PageFrameNumber> {
        self.next
    }

    #[must_use]
    pub const fn prev(&self) -> Option<PageFrameNumber> {
        self.prev
    }
}

/// Per-frame descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRecord {
    flags: PageFlags,
    link: ListLink,
    state: PageState,
}

/// Generates `is_*`/`set_*`/`clear_*` for a boolean page flag.
macro_rules! page_flag_ops {
    ($($flag:ident: $test:ident, $set:ident, $clear:ident;)*) => {
        $(
            #[doc = concat!("Whether the `", stringify!($flag), "` flag is set.")]
            #[inline]
            #[must_use]
            pub const fn $test(&self) -> bool {
                self.flags.$flag()
            }

            #[doc = concat!("Set the `", stringify!($flag), "` flag.")]
            #[inline]
            pub const fn $set(&mut self) {
                self.flags.$set(true);
            }

            #[doc = concat!("Clear the `", stringify!($flag), "` flag.")]
            #[inline]
            pub const fn $clear(&mut self) {
                self.flags.$set(false);
            }
        )*
    };
}

impl PageRecord {
    /// Fresh record for a frame in `zone`: allocated, unmovable, unlinked.
    #[must_use]
    pub const fn new(zone: ZoneType) -> Self {
        Self {
            flags: PageFlags::new()
                .with_zone(zone)
                .with_migratetype(MigrateType::Unmovable),
            link: ListLink::empty(),
            state: PageState::Allocated,
        }
    }

    page_flag_ops! {
        locked: is_locked, set_locked, clear_locked;
        buddy: is_buddy, set_buddy, clear_buddy;
        slab: is_slab, set_slab, clear_slab;
        compound: is_compound, set_compound, clear_compound;
    }

    #[inline]
    #[must_use]
    pub const fn flags(&self) -> PageFlags {
        self.flags
    }

    #[inline]
    #[must_use]
    pub const fn zone(&self) -> ZoneType {
        self.flags.zone()
    }

    #[inline]
    pub const fn set_zone(&mut self, zone: ZoneType) {
        self.flags.set_zone(zone);
    }

    #[inline]
    #[must_use]
    pub const fn migratetype(&self) -> MigrateType {
        self.flags.migratetype()
    }

    #[inline]
    pub const fn set_migratetype(&mut self, migratetype: MigrateType) {
        self.flags.set_migratetype(migratetype);
    }

    #[inline]
    #[must_use]
    pub const fn state(&self) -> PageState {
        self.state
    }

    #[inline]
    pub(crate) const fn set_state(&mut self, state: PageState) {
        self.state = state;
    }

    #[inline]
    #[must_use]
    pub const fn link(&self) -> &ListLink {
        &self.link
    }

    #[inline]
    pub(crate) const fn link_mut(&mut self) -> &mut ListLink {
        &mut self.link
    }

    /// Order of the free block this frame starts, if it is on a free list.
    #[inline]
    #[must_use]
    pub const fn free_order(&self) -> Option<usize> {
        match self.state {
            PageState::Free { order } => Some(order),
            _ => None,
        }
    }

    /// Order of the compound run this frame heads.
    #[inline]
    #[must_use]
    pub const fn compound_order(&self) -> Option<usize> {
        match self.state {
            PageState::CompoundHead { order } => Some(order),
            _ => None,
        }
    }

    /// Head frame of the compound run this frame is a tail of.
    #[inline]
    #[must_use]
    pub const fn compound_head(&self) -> Option<PageFrameNumber> {
        match self.state {
            PageState::CompoundTail { head } => Some(head),
            _ => None,
        }
    }
}
