//! # Page Allocator Façade
//!
//! [`PageAllocator`] owns the zones, the page metadata array and the
//! physical/virtual translator. It is built once by
//! [`PageAllocator::bootstrap`] and afterwards serves power-of-two runs of
//! frames by order.
//!
//! Two calling conventions exist side by side:
//!
//! | Frame handles                                  | Mapped addresses                      |
//! |------------------------------------------------|---------------------------------------|
//! | [`allocate_pages`](PageAllocator::allocate_pages) → `Result<PageFrameNumber, AllocError>` | [`alloc_pages`](PageAllocator::alloc_pages) → `Option<VirtualAddress>` |
//! | [`deallocate_pages`](PageAllocator::deallocate_pages) | [`free_pages`](PageAllocator::free_pages) (no-op on null) |
//!
//! ## Caller obligations
//!
//! A block must be freed exactly once, with the order it was allocated with.
//! Double frees, mismatched orders and frees of foreign addresses are
//! undefined: the free lists may be corrupted. Debug builds assert on the
//! cases that can be detected cheaply.

use crate::buddy;
use crate::gfp::GfpFlags;
use crate::mapper::PhysMapper;
use crate::mem_map::MemMap;
use crate::page::{PageRecord, PageState};
use crate::page_flags::{MAX_NR_ZONES, MigrateType, ZoneType};
use crate::zone::{FreeAreaSnapshot, Zone, ZoneLayout};
use kernel_info::memory::MAX_ORDER;
use kernel_memory_addresses::{PageFrameNumber, PhysicalAddress, VirtualAddress, pfn_to_phys, phys_to_pfn};
use log::{debug, error};

/// Why an allocation could not be served.
#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AllocError {
    #[error("out of memory for an order-{order} block")]
    OutOfMemory { order: usize },
    #[error("order {order} exceeds the largest supported order")]
    InvalidOrder { order: usize },
}

/// Buddy allocator over one contiguous page metadata array.
pub struct PageAllocator<'a, M: PhysMapper> {
    zones: [Zone; MAX_NR_ZONES],
    mem_map: MemMap<'a>,
    mapper: M,
}

impl<'a, M: PhysMapper> PageAllocator<'a, M> {
    /// Claim the frames of `mem_map` for the zones of `layout`, all free areas empty.
    pub(crate) fn new(mem_map: MemMap<'a>, mapper: M, layout: &ZoneLayout) -> Self {
        let (lo, hi) = (mem_map.base_pfn(), mem_map.end_pfn());
        let zones = ZoneType::ALL.map(|zone_type| {
            let mut zone = Zone::new(zone_type);
            let (start, pages) = layout.span(zone_type, lo, hi);
            zone.init(start, pages);
            zone
        });
        Self {
            zones,
            mem_map,
            mapper,
        }
    }

    /// Allocate `2^order` contiguous frames and return the first.
    ///
    /// # Errors
    /// - [`AllocError::InvalidOrder`] if `order >= MAX_ORDER`.
    /// - [`AllocError::OutOfMemory`] if the zone selected by `gfp` has no free
    ///   block of at least `order` in the selected migration class.
    pub fn allocate_pages(&mut self, gfp: GfpFlags, order: usize) -> Result<PageFrameNumber, AllocError> {
        if order >= MAX_ORDER {
            return Err(AllocError::InvalidOrder { order });
        }

        let zone_type = gfp.zone_type();
        let migratetype = gfp.migratetype();
        let zone = &mut self.zones[zone_type.index()];
        buddy::rmqueue(zone, &mut self.mem_map, order, migratetype).ok_or_else(|| {
            debug!("{zone_type}: no free order-{order} {migratetype} block");
            AllocError::OutOfMemory { order }
        })
    }

    /// Allocate `2^order` contiguous frames and return their mapped address.
    ///
    /// `None` on any failure; see [`allocate_pages`](Self::allocate_pages).
    pub fn alloc_pages(&mut self, gfp: GfpFlags, order: usize) -> Option<VirtualAddress> {
        let pfn = self.allocate_pages(gfp, order).ok()?;
        Some(self.page_address(pfn))
    }

    /// Allocate a single frame and return its mapped address.
    pub fn alloc_page(&mut self, gfp: GfpFlags) -> Option<VirtualAddress> {
        self.alloc_pages(gfp, 0)
    }

    /// Return the order-`order` block starting at `pfn`.
    ///
    /// The zone and migration class are taken from the frame's own record.
    /// Frames outside the metadata array and orders of `MAX_ORDER` or more
    /// are logged and ignored.
    pub fn deallocate_pages(&mut self, pfn: PageFrameNumber, order: usize) {
        if order >= MAX_ORDER {
            error!("free of frame {pfn} with invalid order {order}");
            return;
        }
        let Some(page) = self.mem_map.get(pfn) else {
            error!("free of untracked frame {pfn} (order {order})");
            return;
        };
        debug_assert_eq!(page.state(), PageState::Allocated, "frame {pfn} is not an allocated block");

        let zone_type = page.zone();
        let migratetype = page.migratetype();
        let zone = &mut self.zones[zone_type.index()];
        buddy::free_one(zone, &mut self.mem_map, pfn, order, migratetype);
    }

    /// Return the order-`order` block mapped at `va`. Null is ignored.
    pub fn free_pages(&mut self, va: VirtualAddress, order: usize) {
        if va.is_null() {
            return;
        }
        let pfn = self.virt_to_pfn(va);
        self.deallocate_pages(pfn, order);
    }

    /// Return the single frame mapped at `va`. Null is ignored.
    pub fn free_page(&mut self, va: VirtualAddress) {
        self.free_pages(va, 0);
    }

    /// Record of `pfn`, if tracked.
    #[must_use]
    pub fn pfn_to_page(&self, pfn: PageFrameNumber) -> Option<&PageRecord> {
        self.mem_map.get(pfn)
    }

    /// Frame described by `page`, if it lives in this allocator's metadata array.
    #[must_use]
    pub fn page_to_pfn(&self, page: &PageRecord) -> Option<PageFrameNumber> {
        self.mem_map.pfn_of(page)
    }

    #[must_use]
    pub fn phys_to_page(&self, pa: PhysicalAddress) -> Option<&PageRecord> {
        self.pfn_to_page(phys_to_pfn(pa))
    }

    #[must_use]
    pub fn page_to_phys(&self, page: &PageRecord) -> Option<PhysicalAddress> {
        self.page_to_pfn(page).map(pfn_to_phys)
    }

    /// Frame backing the mapped address `va`.
    #[must_use]
    pub fn virt_to_pfn(&self, va: VirtualAddress) -> PageFrameNumber {
        phys_to_pfn(self.mapper.virt_to_phys(va))
    }

    #[must_use]
    pub fn virt_to_page(&self, va: VirtualAddress) -> Option<&PageRecord> {
        self.pfn_to_page(self.virt_to_pfn(va))
    }

    #[must_use]
    pub fn page_to_virt(&self, page: &PageRecord) -> Option<VirtualAddress> {
        self.page_to_pfn(page).map(|pfn| self.page_address(pfn))
    }

    /// Mapped address of the first byte of frame `pfn`.
    #[must_use]
    pub fn page_address(&self, pfn: PageFrameNumber) -> VirtualAddress {
        self.mapper.phys_to_virt(pfn_to_phys(pfn))
    }

    /// Head frame of the run containing `va`: the frame itself unless it is a
    /// compound tail.
    #[must_use]
    pub fn virt_to_head_page(&self, va: VirtualAddress) -> Option<PageFrameNumber> {
        self.compound_head(self.virt_to_pfn(va))
    }

    /// Head frame of the run containing `pfn`; `None` for untracked frames.
    #[must_use]
    pub fn compound_head(&self, pfn: PageFrameNumber) -> Option<PageFrameNumber> {
        let page = self.mem_map.get(pfn)?;
        Some(page.compound_head().unwrap_or(pfn))
    }

    #[must_use]
    pub const fn zone(&self, zone_type: ZoneType) -> &Zone {
        &self.zones[zone_type.index()]
    }

    #[must_use]
    pub const fn zones(&self) -> &[Zone; MAX_NR_ZONES] {
        &self.zones
    }

    /// Free-list occupancy of `zone_type`.
    #[must_use]
    pub fn snapshot(&self, zone_type: ZoneType) -> FreeAreaSnapshot {
        self.zone(zone_type).snapshot()
    }

    /// Free order-`order` blocks in `zone_type`.
    ///
    /// # Panics
    /// If `order >= MAX_ORDER`.
    #[must_use]
    pub const fn nr_free(&self, zone_type: ZoneType, order: usize) -> usize {
        self.zone(zone_type).free_area(order).nr_free()
    }

    /// Length of one free list.
    ///
    /// # Panics
    /// If `order >= MAX_ORDER`.
    #[must_use]
    pub const fn free_list_len(&self, zone_type: ZoneType, order: usize, migratetype: MigrateType) -> usize {
        self.zone(zone_type).free_area(order).list(migratetype).len()
    }

    /// Free frames across all zones.
    #[must_use]
    pub fn free_pages_total(&self) -> u64 {
        self.zones.iter().map(Zone::free_pages).sum()
    }

    #[must_use]
    pub const fn mem_map(&self) -> &MemMap<'a> {
        &self.mem_map
    }

    #[must_use]
    pub const fn mapper(&self) -> &M {
        &self.mapper
    }

    pub(crate) const fn mem_map_mut(&mut self) -> &mut MemMap<'a> {
        &mut self.mem_map
    }
}
