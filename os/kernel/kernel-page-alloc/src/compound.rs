//! # Compound Pages
//!
//! A compound page is an order-`n` run handed out as one object. The head
//! frame records the order; every tail frame records the head, so any
//! address inside the run resolves back to the head:
//!
//! ```text
//!  frame:   H          H+1               H+2               H+3
//!  state:   Head{n=2}  Tail{head: H}     Tail{head: H}     Tail{head: H}
//!  flags:   compound   compound          compound          compound
//! ```

use crate::allocator::{AllocError, PageAllocator};
use crate::gfp::GfpFlags;
use crate::mapper::PhysMapper;
use crate::page::{PageRecord, PageState};
use kernel_memory_addresses::{PageFrameNumber, VirtualAddress};
use log::warn;

impl<M: PhysMapper> PageAllocator<'_, M> {
    /// Allocate an order-`order` compound run and return its head frame.
    ///
    /// # Errors
    /// As for [`allocate_pages`](Self::allocate_pages).
    pub fn allocate_compound_pages(&mut self, gfp: GfpFlags, order: usize) -> Result<PageFrameNumber, AllocError> {
        let head = self.allocate_pages(gfp, order)?;
        let run = self.mem_map_mut().run_mut(head, order);
        let (first, tails) = run.split_at_mut(1);

        first[0].set_compound();
        first[0].set_state(PageState::CompoundHead { order });
        for tail in tails {
            tail.set_compound();
            tail.set_state(PageState::CompoundTail { head });
        }
        Ok(head)
    }

    /// Allocate an order-`order` compound run and return its mapped address.
    pub fn alloc_compound_pages(&mut self, gfp: GfpFlags, order: usize) -> Option<VirtualAddress> {
        let head = self.allocate_compound_pages(gfp, order).ok()?;
        Some(self.page_address(head))
    }

    /// Return the compound run containing `pfn`.
    ///
    /// `pfn` may be the head or any tail. Frames that are not part of a
    /// compound run are logged and left alone.
    pub fn deallocate_compound_pages(&mut self, pfn: PageFrameNumber) {
        let Some(head) = self.compound_head(pfn) else {
            warn!("compound free of untracked frame {pfn}");
            return;
        };
        let Some(order) = self.pfn_to_page(head).and_then(PageRecord::compound_order) else {
            warn!("compound free of {pfn}: {head} is not a compound head");
            return;
        };

        for page in self.mem_map_mut().run_mut(head, order) {
            page.clear_compound();
            page.set_state(PageState::Allocated);
        }
        self.deallocate_pages(head, order);
    }

    /// Return the compound run containing the mapped address `va`. Null is ignored.
    pub fn free_compound_pages(&mut self, va: VirtualAddress) {
        if va.is_null() {
            return;
        }
        let pfn = self.virt_to_pfn(va);
        self.deallocate_compound_pages(pfn);
    }
}
