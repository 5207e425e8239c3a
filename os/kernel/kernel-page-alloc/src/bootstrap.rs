//! # Bootstrap
//!
//! Brings all usable physical memory under the buddy allocator in one pass:
//!
//! 1. Size the page metadata array for the span from the lowest to the highest
//!    usable frame and place it with the provider's early bump allocator.
//! 2. Write one record per frame, with its zone set and its list link empty.
//! 3. Lay out the zones, emptying every free area, and have the provider
//!    isolate each zone's range. An isolation failure aborts bootstrap.
//! 4. For every free range (usable minus reserved, metadata array included),
//!    clipped to each zone, release the largest naturally aligned blocks that
//!    fit through the normal free path.
//!
//! ```text
//!   [start ................................................. end)
//!   ├ o0 ┤├── o1 ──┤├────── o2 ──────┤├──────────── o3 ...
//!   start is walked upward; each block is the largest order that is
//!   aligned at start and still ends at or before end.
//! ```

use crate::allocator::PageAllocator;
use crate::mapper::PhysMapper;
use crate::mem_map::MemMap;
use crate::page::PageRecord;
use crate::page_flags::ZoneType;
use crate::zone::ZoneLayout;
use kernel_info::memory::{MAX_ORDER, PAGE_SIZE};
use kernel_memory_addresses::{PageFrameNumber, PhysicalAddress, PhysicalRange};
use log::{debug, error, info};

/// Early boot memory map and bump allocator.
///
/// Region lists are reported in ascending address order.
pub trait RegionProvider {
    /// All usable RAM.
    fn memory_regions(&self) -> impl Iterator<Item = PhysicalRange> + '_;

    /// Ranges inside usable RAM that are already in use (kernel image,
    /// firmware tables, earlier bump allocations).
    fn reserved_regions(&self) -> impl Iterator<Item = PhysicalRange> + '_;

    /// Reserve `size` bytes aligned to `align` and return their base.
    ///
    /// The reservation must show up in [`reserved_regions`](Self::reserved_regions)
    /// afterwards, unless it lies outside [`memory_regions`](Self::memory_regions).
    fn alloc(&mut self, size: u64, align: u64) -> Option<PhysicalAddress>;

    /// Split the region table so that `range` is covered by whole regions.
    ///
    /// # Errors
    /// If the table cannot represent the split.
    fn isolate_range(&mut self, range: PhysicalRange) -> Result<(), IsolationError>;

    /// Call `f` for every usable range not covered by a reserved range.
    fn for_each_free_region(&self, mut f: impl FnMut(PhysicalRange)) {
        for region in self.memory_regions() {
            let mut cursor = region.start;
            for reserved in self.reserved_regions() {
                if reserved.end <= cursor {
                    continue;
                }
                if reserved.start >= region.end {
                    break;
                }
                if reserved.start > cursor {
                    f(PhysicalRange::new(cursor, reserved.start));
                }
                cursor = cursor.max(reserved.end);
            }
            if cursor < region.end {
                f(PhysicalRange::new(cursor, region.end));
            }
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IsolationError {
    #[error("region table is full ({max} entries)")]
    TableFull { max: usize },
    #[error("{0} is not covered by usable memory")]
    NotCovered(PhysicalRange),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BootstrapError {
    #[error("no usable memory reported")]
    NoMemory,
    #[error("cannot place the page metadata array ({bytes} bytes)")]
    MemMapAllocation { bytes: u64 },
    #[error("failed to isolate zone {zone} at {range}")]
    Isolation {
        zone: ZoneType,
        range: PhysicalRange,
        #[source]
        source: IsolationError,
    },
}

impl<M: PhysMapper> PageAllocator<'_, M> {
    /// Build an allocator over all usable memory reported by `provider`.
    ///
    /// Returns the allocator and the number of frames released into it.
    ///
    /// # Errors
    /// - [`BootstrapError::NoMemory`] if no usable frame is reported.
    /// - [`BootstrapError::MemMapAllocation`] if the metadata array cannot be placed.
    /// - [`BootstrapError::Isolation`] if a zone's range cannot be isolated.
    ///
    /// # Safety
    /// - `mapper` must map every byte `provider.alloc` hands out, and the
    ///   mapping must stay valid and exclusively owned by the allocator for its lifetime.
    /// - All reported usable, unreserved memory must be free for the allocator
    ///   to hand out.
    pub unsafe fn bootstrap<P: RegionProvider>(
        provider: &mut P,
        mapper: M,
        layout: &ZoneLayout,
    ) -> Result<(Self, u64), BootstrapError> {
        let (lo, hi) = usable_span(provider).ok_or(BootstrapError::NoMemory)?;
        let span = hi.as_u64() - lo.as_u64();
        info!("Usable frames {lo}..{hi} ({span} frames)");

        // SAFETY: forwarded from the caller.
        let records = unsafe { alloc_mem_map(provider, &mapper, layout, lo, span)? };
        let mut allocator = Self::new(MemMap::new(lo, records), mapper, layout);

        for zone in allocator.zones() {
            let range = zone.range();
            info!("Zone {}: {range} ({} frames)", zone.zone_type(), zone.pages());
            if zone.is_empty() {
                continue;
            }
            if let Err(source) = provider.isolate_range(range) {
                error!("Failed to isolate zone {} at {range}: {source}", zone.zone_type());
                return Err(BootstrapError::Isolation {
                    zone: zone.zone_type(),
                    range,
                    source,
                });
            }
        }

        let mut released = 0;
        provider.for_each_free_region(|region| {
            released += allocator.release_region(region);
        });
        info!("Released {released} frames to the page allocator");
        Ok((allocator, released))
    }

    /// Free every whole frame of `region`, zone by zone.
    fn release_region(&mut self, region: PhysicalRange) -> u64 {
        let (start, end) = region.frames();
        let mut released = 0;
        for zone_type in ZoneType::ALL {
            let zone = self.zone(zone_type);
            let lo = start.max(zone.start_pfn());
            let hi = end.min(zone.end_pfn());
            released += self.carve(lo, hi);
        }
        released
    }

    /// Free `[start, end)` as naturally aligned blocks, largest first.
    fn carve(&mut self, mut start: PageFrameNumber, end: PageFrameNumber) -> u64 {
        let mut released = 0;
        while start < end {
            let order = largest_order(start, end);
            debug!("Releasing order-{order} block at {start}");
            self.deallocate_pages(start, order);
            start += 1 << order;
            released += 1 << order;
        }
        released
    }
}

/// Lowest and one-past-highest whole usable frame.
fn usable_span<P: RegionProvider>(provider: &P) -> Option<(PageFrameNumber, PageFrameNumber)> {
    provider
        .memory_regions()
        .map(PhysicalRange::frames)
        .filter(|(start, end)| start < end)
        .reduce(|(lo, hi), (start, end)| (lo.min(start), hi.max(end)))
}

/// Place and initialize one record per frame in `[lo, lo + span)`.
///
/// # Safety
/// See [`PageAllocator::bootstrap`].
unsafe fn alloc_mem_map<'a, P: RegionProvider, M: PhysMapper>(
    provider: &mut P,
    mapper: &M,
    layout: &ZoneLayout,
    lo: PageFrameNumber,
    span: u64,
) -> Result<&'a mut [PageRecord], BootstrapError> {
    let bytes = span * size_of::<PageRecord>() as u64;
    let len = usize::try_from(span).map_err(|_| BootstrapError::MemMapAllocation { bytes })?;
    let pa = provider
        .alloc(bytes, PAGE_SIZE)
        .ok_or(BootstrapError::MemMapAllocation { bytes })?;
    let records: *mut PageRecord = mapper.phys_to_virt(pa).as_mut_ptr();
    debug_assert!(records.is_aligned(), "metadata array at {pa} is misaligned");
    info!("Page metadata array: {len} records ({bytes} bytes) at {pa}");

    for (i, pfn) in (lo.as_u64()..lo.as_u64() + span).enumerate() {
        let record = PageRecord::new(layout.zone_of(PageFrameNumber::new(pfn)));
        // SAFETY: `records` points at `len` mapped, exclusively owned slots.
        unsafe { records.add(i).write(record) };
    }
    // SAFETY: all `len` slots were initialized above.
    Ok(unsafe { core::slice::from_raw_parts_mut(records, len) })
}

/// Largest order whose block is aligned at `start` and ends by `end`.
fn largest_order(start: PageFrameNumber, end: PageFrameNumber) -> usize {
    let room = end.as_u64() - start.as_u64();
    (0..MAX_ORDER)
        .rev()
        .find(|&order| start.is_aligned(order) && (1u64 << order) <= room)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pfn(raw: u64) -> PageFrameNumber {
        PageFrameNumber::new(raw)
    }

    struct Regions {
        memory: Vec<PhysicalRange>,
        reserved: Vec<PhysicalRange>,
    }

    impl RegionProvider for Regions {
        fn memory_regions(&self) -> impl Iterator<Item = PhysicalRange> + '_ {
            self.memory.iter().copied()
        }

        fn reserved_regions(&self) -> impl Iterator<Item = PhysicalRange> + '_ {
            self.reserved.iter().copied()
        }

        fn alloc(&mut self, _size: u64, _align: u64) -> Option<PhysicalAddress> {
            None
        }

        fn isolate_range(&mut self, _range: PhysicalRange) -> Result<(), IsolationError> {
            Ok(())
        }
    }

    #[test]
    fn largest_order_respects_alignment_and_room() {
        assert_eq!(largest_order(pfn(0x100), pfn(0x110)), 4);
        assert_eq!(largest_order(pfn(0x101), pfn(0x110)), 0);
        assert_eq!(largest_order(pfn(0x104), pfn(0x110)), 2);
        assert_eq!(largest_order(pfn(0x108), pfn(0x10f)), 2);
        assert_eq!(largest_order(pfn(0), pfn(0x10_0000)), MAX_ORDER - 1);
    }

    #[test]
    fn reserved_ranges_are_cut_out_of_memory() {
        let regions = Regions {
            memory: vec![
                PhysicalRange::from_base_size(0x0, 0x10_000),
                PhysicalRange::from_base_size(0x20_000, 0x10_000),
            ],
            reserved: vec![
                PhysicalRange::from_base_size(0x0, 0x1000),
                PhysicalRange::from_base_size(0x4000, 0x2000),
                PhysicalRange::from_base_size(0x5000, 0x2000),
                PhysicalRange::from_base_size(0x2f_000, 0x2000),
            ],
        };

        let mut free = Vec::new();
        regions.for_each_free_region(|r| free.push(r));
        assert_eq!(
            free,
            [
                PhysicalRange::from_base_size(0x1000, 0x3000),
                PhysicalRange::from_base_size(0x7000, 0x9000),
                PhysicalRange::from_base_size(0x20_000, 0xf000),
            ]
        );
    }

    #[test]
    fn span_covers_holes_and_ignores_partial_frames() {
        let regions = Regions {
            memory: vec![
                PhysicalRange::from_base_size(0x1800, 0x800),
                PhysicalRange::from_base_size(0x10_0000, 0x4000),
                PhysicalRange::from_base_size(0x20_0000, 0x2800),
            ],
            reserved: Vec::new(),
        };
        assert_eq!(usable_span(&regions), Some((pfn(0x100), pfn(0x202))));
    }

    #[test]
    fn no_whole_frame_means_no_memory() {
        let regions = Regions {
            memory: vec![PhysicalRange::from_base_size(0x1800, 0x400)],
            reserved: Vec::new(),
        };
        assert_eq!(usable_span(&regions), None);
    }
}
