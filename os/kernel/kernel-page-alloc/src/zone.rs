//! # Zones and Free Areas
//!
//! A [`Zone`] owns the frames `[start_pfn, start_pfn + pages)` and one
//! [`FreeArea`] per buddy order. A free area holds one [`FreeList`] per
//! migration class plus the number of free blocks of its order across all
//! classes.
//!
//! ```text
//! Zone ─┬─ free_area[0]  ─┬─ free_list[Unmovable]
//!       │                 └─ free_list[Movable]
//!       ├─ free_area[1]  ─┬─ ...
//!       ⋮
//!       └─ free_area[MAX_ORDER - 1]
//! ```
//!
//! Zone boundaries come from a [`ZoneLayout`]: a fixed table of ascending,
//! exclusive frame ceilings. Zones never overlap and are written exactly once,
//! at bootstrap.

use crate::free_list::FreeList;
use crate::page_flags::{MAX_NR_ZONES, MIGRATE_TYPES, MigrateType, ZoneType};
use kernel_info::memory::{MAX_ORDER, ZONE_DMA_END};
use kernel_memory_addresses::{PageFrameNumber, PhysicalAddress, PhysicalRange, phys_to_pfn};

/// Free blocks of a single order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreeArea {
    pub(crate) free_list: [FreeList; MIGRATE_TYPES],
    pub(crate) nr_free: usize,
}

impl FreeArea {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            free_list: [FreeList::new(); MIGRATE_TYPES],
            nr_free: 0,
        }
    }

    /// Empty every list and zero the count.
    pub fn init(&mut self) {
        for list in &mut self.free_list {
            list.init();
        }
        self.nr_free = 0;
    }

    /// Free blocks of this order across all migration classes.
    #[inline]
    #[must_use]
    pub const fn nr_free(&self) -> usize {
        self.nr_free
    }

    #[inline]
    #[must_use]
    pub const fn list(&self, migratetype: MigrateType) -> &FreeList {
        &self.free_list[migratetype.index()]
    }
}

/// A physical memory zone with its buddy free areas.
#[derive(Debug, Clone)]
pub struct Zone {
    kind: ZoneType,
    start_pfn: PageFrameNumber,
    pages: u64,
    pub(crate) free_area: [FreeArea; MAX_ORDER],
}

impl Zone {
    /// An empty zone spanning no frames.
    #[must_use]
    pub const fn new(kind: ZoneType) -> Self {
        Self {
            kind,
            start_pfn: PageFrameNumber::new(0),
            pages: 0,
            free_area: [FreeArea::new(); MAX_ORDER],
        }
    }

    /// Claim `[start_pfn, start_pfn + pages)` and empty all free areas.
    pub(crate) fn init(&mut self, start_pfn: PageFrameNumber, pages: u64) {
        self.start_pfn = start_pfn;
        self.pages = pages;
        for area in &mut self.free_area {
            area.init();
        }
    }

    #[inline]
    #[must_use]
    pub const fn zone_type(&self) -> ZoneType {
        self.kind
    }

    #[inline]
    #[must_use]
    pub const fn start_pfn(&self) -> PageFrameNumber {
        self.start_pfn
    }

    /// Number of frames spanned, free or not.
    #[inline]
    #[must_use]
    pub const fn pages(&self) -> u64 {
        self.pages
    }

    #[inline]
    #[must_use]
    pub const fn end_pfn(&self) -> PageFrameNumber {
        PageFrameNumber::new(self.start_pfn.as_u64() + self.pages)
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pages == 0
    }

    #[inline]
    #[must_use]
    pub fn spans(&self, pfn: PageFrameNumber) -> bool {
        self.start_pfn <= pfn && pfn < self.end_pfn()
    }

    /// Physical byte range covered by the zone.
    #[must_use]
    pub const fn range(&self) -> PhysicalRange {
        PhysicalRange::from_frames(self.start_pfn, self.end_pfn())
    }

    /// # Panics
    /// If `order >= MAX_ORDER`.
    #[inline]
    #[must_use]
    pub const fn free_area(&self, order: usize) -> &FreeArea {
        &self.free_area[order]
    }

    /// Frames currently free in this zone.
    #[must_use]
    pub fn free_pages(&self) -> u64 {
        self.snapshot().free_pages()
    }

    /// Copy of every free-list count.
    #[must_use]
    pub fn snapshot(&self) -> FreeAreaSnapshot {
        let mut snapshot = FreeAreaSnapshot::default();
        for (order, area) in self.free_area.iter().enumerate() {
            snapshot.nr_free[order] = area.nr_free;
            for mt in MigrateType::ALL {
                snapshot.counts[order][mt.index()] = area.list(mt).len();
            }
        }
        snapshot
    }
}

/// Occupancy of a zone's free areas at one point in time.
///
/// Two snapshots compare equal when every `(order, migration class)` list has
/// the same length, which is what "the free-list shape is restored" means.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FreeAreaSnapshot {
    counts: [[usize; MIGRATE_TYPES]; MAX_ORDER],
    nr_free: [usize; MAX_ORDER],
}

impl FreeAreaSnapshot {
    /// Free blocks of `order` across all classes.
    #[must_use]
    pub const fn nr_free(&self, order: usize) -> usize {
        self.nr_free[order]
    }

    /// Free blocks of `order` in the `migratetype` list.
    #[must_use]
    pub const fn count(&self, order: usize, migratetype: MigrateType) -> usize {
        self.counts[order][migratetype.index()]
    }

    /// Every `(order, class, count)` triple, orders ascending.
    pub fn iter(&self) -> impl Iterator<Item = (usize, MigrateType, usize)> + '_ {
        (0..MAX_ORDER).flat_map(move |order| {
            MigrateType::ALL
                .into_iter()
                .map(move |mt| (order, mt, self.counts[order][mt.index()]))
        })
    }

    /// Total free frames.
    #[must_use]
    pub fn free_pages(&self) -> u64 {
        self.nr_free
            .iter()
            .enumerate()
            .map(|(order, &n)| (n as u64) << order)
            .sum()
    }
}

/// Assignment of frame numbers to zones.
///
/// `ends[i]` is the exclusive frame ceiling of zone `ZoneType::ALL[i]`; the
/// ceilings ascend and the last zone is open ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneLayout {
    ends: [PageFrameNumber; MAX_NR_ZONES],
}

/// DMA below [`ZONE_DMA_END`], normal memory above.
pub const DEFAULT_ZONE_LAYOUT: ZoneLayout = ZoneLayout::new([
    phys_to_pfn(PhysicalAddress::new(ZONE_DMA_END)),
    PageFrameNumber::new(u64::MAX),
]);

impl ZoneLayout {
    /// # Panics
    /// At compile time (in `const` use) if the ceilings are not ascending.
    #[must_use]
    pub const fn new(ends: [PageFrameNumber; MAX_NR_ZONES]) -> Self {
        let mut i = 1;
        while i < MAX_NR_ZONES {
            assert!(ends[i - 1].as_u64() <= ends[i].as_u64(), "zone ceilings must ascend");
            i += 1;
        }
        Self { ends }
    }

    /// Zone owning `pfn`.
    #[must_use]
    pub fn zone_of(&self, pfn: PageFrameNumber) -> ZoneType {
        ZoneType::ALL
            .into_iter()
            .find(|zone| pfn < self.ends[zone.index()])
            .unwrap_or(ZoneType::ALL[MAX_NR_ZONES - 1])
    }

    /// Frames of `zone` inside `[lo, hi)`, as `(start, pages)`.
    ///
    /// Zones that do not intersect the window get zero pages, placed at the
    /// window edge so that consecutive zones stay gap free.
    #[must_use]
    pub fn span(&self, zone: ZoneType, lo: PageFrameNumber, hi: PageFrameNumber) -> (PageFrameNumber, u64) {
        let index = zone.index();
        let floor = if index == 0 {
            lo
        } else {
            self.ends[index - 1]
        };
        let start = floor.clamp(lo, hi);
        let end = self.ends[index].clamp(lo, hi);
        (start, end.as_u64().saturating_sub(start.as_u64()))
    }
}

impl Default for ZoneLayout {
    fn default() -> Self {
        DEFAULT_ZONE_LAYOUT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pfn(raw: u64) -> PageFrameNumber {
        PageFrameNumber::new(raw)
    }

    #[test]
    fn default_layout_splits_at_one_mebibyte() {
        let layout = DEFAULT_ZONE_LAYOUT;
        assert_eq!(layout.zone_of(pfn(0)), ZoneType::Dma);
        assert_eq!(layout.zone_of(pfn(0xff)), ZoneType::Dma);
        assert_eq!(layout.zone_of(pfn(0x100)), ZoneType::Normal);
        assert_eq!(layout.zone_of(pfn(0xf_ffff)), ZoneType::Normal);
    }

    #[test]
    fn spans_partition_the_window_without_gaps() {
        let layout = DEFAULT_ZONE_LAYOUT;
        let (lo, hi) = (pfn(0x80), pfn(0x180));

        let (dma_start, dma_pages) = layout.span(ZoneType::Dma, lo, hi);
        let (normal_start, normal_pages) = layout.span(ZoneType::Normal, lo, hi);
        assert_eq!((dma_start, dma_pages), (pfn(0x80), 0x80));
        assert_eq!((normal_start, normal_pages), (pfn(0x100), 0x80));
        assert_eq!(dma_start + dma_pages, normal_start);
    }

    #[test]
    fn zone_outside_window_is_empty() {
        let layout = DEFAULT_ZONE_LAYOUT;
        let (start, pages) = layout.span(ZoneType::Dma, pfn(0x100), pfn(0x110));
        assert_eq!((start, pages), (pfn(0x100), 0));

        let (start, pages) = layout.span(ZoneType::Normal, pfn(0x100), pfn(0x110));
        assert_eq!((start, pages), (pfn(0x100), 0x10));
    }

    #[test]
    fn init_empties_free_areas() {
        let mut zone = Zone::new(ZoneType::Normal);
        zone.free_area[3].nr_free = 5;
        zone.init(pfn(0x100), 16);

        assert_eq!(zone.zone_type(), ZoneType::Normal);
        assert_eq!(zone.range(), PhysicalRange::from_base_size(0x10_0000, 0x1_0000));
        assert!(zone.spans(pfn(0x10f)));
        assert!(!zone.spans(pfn(0x110)));
        assert_eq!(zone.snapshot(), FreeAreaSnapshot::default());
    }
}
