//! # Intrusive Free Lists
//!
//! A [`FreeList`] is a doubly linked list whose nodes are the [`ListLink`]s
//! embedded in the page records of the frames on the list. The list itself
//! stores only the first frame and a count, so push, pop and removal of an
//! arbitrary member are O(1) and need no memory of their own.
//!
//! ```text
//! FreeList { head } ──► PFN a ◄──► PFN b ◄──► PFN c ──► None
//! ```
//!
//! Order within a list carries no meaning; new entries go to the front.

use crate::mem_map::MemMap;
use crate::page::ListLink;
use kernel_memory_addresses::PageFrameNumber;

/// # Invariants
/// - Every member's record is linked; every non-member used with this list is unlinked.
/// - `len` is the number of members.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreeList {
    head: Option<PageFrameNumber>,
    len: usize,
}

impl FreeList {
    #[must_use]
    pub const fn new() -> Self {
        Self { head: None, len: 0 }
    }

    /// Forget all members without touching their records.
    ///
    /// Only valid before any record was linked, i.e. during bootstrap.
    pub const fn init(&mut self) {
        *self = Self::new();
    }

    #[inline]
    #[must_use]
    pub const fn first(&self) -> Option<PageFrameNumber> {
        self.head
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    /// Link `pfn` in as the new first member.
    pub fn push_front(&mut self, map: &mut MemMap<'_>, pfn: PageFrameNumber) {
        let old = self.head;
        let link = map[pfn].link_mut();
        debug_assert!(link.is_unlinked(), "frame {pfn} is already on a list");
        *link = ListLink {
            prev: None,
            next: old,
        };
        if let Some(old) = old {
            map[old].link_mut().prev = Some(pfn);
        }
        self.head = Some(pfn);
        self.len += 1;
    }

    /// Unlink member `pfn`.
    pub fn remove(&mut self, map: &mut MemMap<'_>, pfn: PageFrameNumber) {
        let ListLink { prev, next } = core::mem::take(map[pfn].link_mut());
        debug_assert_eq!(prev.is_none(), self.head == Some(pfn), "frame {pfn} is not on this list");
        if let Some(prev) = prev {
            map[prev].link_mut().next = next;
        }
        if let Some(next) = next {
            map[next].link_mut().prev = prev;
        }
        if self.head == Some(pfn) {
            self.head = next;
        }
        self.len -= 1;
    }

    /// Unlink and return the first member.
    pub fn pop_front(&mut self, map: &mut MemMap<'_>) -> Option<PageFrameNumber> {
        let pfn = self.head?;
        self.remove(map, pfn);
        Some(pfn)
    }

    /// Members from first to last.
    pub fn iter<'m>(&self, map: &'m MemMap<'_>) -> impl Iterator<Item = PageFrameNumber> + 'm {
        core::iter::successors(self.head, move |&pfn| map[pfn].link().next())
    }
}
