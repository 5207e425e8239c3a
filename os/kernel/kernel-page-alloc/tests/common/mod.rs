//! Host-backed physical memory and a memblock-style region provider.

#![allow(dead_code)]

use kernel_page_alloc::{
    BootstrapError, DEFAULT_ZONE_LAYOUT, DirectMapper, IsolationError, PageAllocator, PhysicalAddress, PhysicalRange,
    RegionProvider,
};

/// A 4 KiB-aligned raw frame backing one page of simulated RAM.
#[repr(align(4096))]
struct Aligned4K(#[allow(dead_code)] [u8; 4096]);

impl Aligned4K {
    fn new_zeroed() -> Self {
        Self([0u8; 4096])
    }
}

/// Simulated physical memory covering `[start, end)`.
///
/// Physical addresses map linearly onto the host buffer, so a
/// [`DirectMapper`] with [`TestRam::offset`] translates between the two.
pub struct TestRam {
    frames: Vec<Aligned4K>,
    start: u64,
}

impl TestRam {
    pub fn new(start: u64, end: u64) -> Self {
        assert!(start % 4096 == 0 && end % 4096 == 0 && start < end);
        let n = usize::try_from((end - start) >> 12).expect("fits");
        let mut frames = Vec::with_capacity(n);
        for _ in 0..n {
            frames.push(Aligned4K::new_zeroed());
        }
        Self { frames, start }
    }

    /// Host address minus physical address.
    pub fn offset(&mut self) -> u64 {
        (self.frames.as_mut_ptr() as u64).wrapping_sub(self.start)
    }

    pub fn mapper(&mut self) -> DirectMapper {
        DirectMapper::new(self.offset())
    }
}

/// Early memory map with a bump allocator, after Linux's memblock.
pub struct Memblock {
    pub memory: Vec<PhysicalRange>,
    pub reserved: Vec<PhysicalRange>,
    /// Bump source outside `memory` (a static pool in a real kernel). When
    /// absent, allocations are carved top down from `memory` and reserved.
    pool: Option<PhysicalRange>,
    max_regions: usize,
}

impl Memblock {
    pub fn new(memory: &[(u64, u64)]) -> Self {
        Self {
            memory: memory
                .iter()
                .map(|&(start, end)| PhysicalRange::new(start.into(), end.into()))
                .collect(),
            reserved: Vec::new(),
            pool: None,
            max_regions: 128,
        }
    }

    #[must_use]
    pub fn with_pool(mut self, start: u64, end: u64) -> Self {
        self.pool = Some(PhysicalRange::new(start.into(), end.into()));
        self
    }

    #[must_use]
    pub const fn with_max_regions(mut self, max_regions: usize) -> Self {
        self.max_regions = max_regions;
        self
    }

    #[must_use]
    pub fn reserve(mut self, start: u64, end: u64) -> Self {
        self.add_reserved(PhysicalRange::new(start.into(), end.into()));
        self
    }

    fn add_reserved(&mut self, range: PhysicalRange) {
        let at = self.reserved.partition_point(|r| r.start < range.start);
        self.reserved.insert(at, range);
    }

    fn overlaps_reserved(&self, range: PhysicalRange) -> bool {
        self.reserved.iter().any(|r| r.intersect(range).is_some())
    }

    fn split_at(&mut self, at: PhysicalAddress) -> Result<(), IsolationError> {
        let Some(i) = self.memory.iter().position(|r| r.start < at && at < r.end) else {
            return Ok(());
        };
        if self.memory.len() >= self.max_regions {
            return Err(IsolationError::TableFull {
                max: self.max_regions,
            });
        }
        let region = self.memory[i];
        self.memory[i] = PhysicalRange::new(region.start, at);
        self.memory.insert(i + 1, PhysicalRange::new(at, region.end));
        Ok(())
    }
}

impl RegionProvider for Memblock {
    fn memory_regions(&self) -> impl Iterator<Item = PhysicalRange> + '_ {
        self.memory.iter().copied()
    }

    fn reserved_regions(&self) -> impl Iterator<Item = PhysicalRange> + '_ {
        self.reserved.iter().copied()
    }

    fn alloc(&mut self, size: u64, align: u64) -> Option<PhysicalAddress> {
        if let Some(pool) = &mut self.pool {
            let base = pool.start.as_u64().next_multiple_of(align);
            if base + size > pool.end.as_u64() {
                return None;
            }
            pool.start = PhysicalAddress::new(base + size);
            return Some(PhysicalAddress::new(base));
        }

        let candidates: Vec<_> = self.memory.iter().rev().copied().collect();
        for region in candidates {
            let Some(top) = region.end.as_u64().checked_sub(size) else {
                continue;
            };
            let base = top - top % align;
            let range = PhysicalRange::from_base_size(base, size);
            if base >= region.start.as_u64() && !self.overlaps_reserved(range) {
                self.add_reserved(range);
                return Some(PhysicalAddress::new(base));
            }
        }
        None
    }

    fn isolate_range(&mut self, range: PhysicalRange) -> Result<(), IsolationError> {
        if !self.memory.iter().any(|r| r.intersect(range).is_some()) {
            return Err(IsolationError::NotCovered(range));
        }
        self.split_at(range.start)?;
        self.split_at(range.end)
    }
}

/// Bootstrap an allocator over `memblock` backed by `ram`.
pub fn boot<'a>(
    ram: &'a mut TestRam,
    memblock: &mut Memblock,
) -> Result<(PageAllocator<'a, DirectMapper>, u64), BootstrapError> {
    let mapper = ram.mapper();
    // SAFETY: `ram` covers every address `memblock` reports or hands out, and
    // stays borrowed for as long as the allocator lives.
    unsafe { PageAllocator::bootstrap(memblock, mapper, &DEFAULT_ZONE_LAYOUT) }
}
