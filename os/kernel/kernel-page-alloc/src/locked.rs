//! Shared access to one [`PageAllocator`].
//!
//! [`LockedPageAllocator`] holds the allocator behind a [`SpinLock`] and takes
//! the lock for the whole of every call, split and merge steps included.

use crate::allocator::{AllocError, PageAllocator};
use crate::gfp::GfpFlags;
use crate::mapper::PhysMapper;
use kernel_memory_addresses::{PageFrameNumber, VirtualAddress};
use kernel_sync::{SpinLock, SpinLockGuard};

pub struct LockedPageAllocator<'a, M: PhysMapper> {
    inner: SpinLock<PageAllocator<'a, M>>,
}

impl<'a, M: PhysMapper> LockedPageAllocator<'a, M> {
    #[must_use]
    pub const fn new(allocator: PageAllocator<'a, M>) -> Self {
        Self {
            inner: SpinLock::new(allocator),
        }
    }

    /// Exclusive access for a sequence of calls, e.g. introspection.
    pub fn lock(&self) -> SpinLockGuard<'_, PageAllocator<'a, M>> {
        self.inner.lock()
    }

    /// # Errors
    /// As for [`PageAllocator::allocate_pages`].
    pub fn allocate_pages(&self, gfp: GfpFlags, order: usize) -> Result<PageFrameNumber, AllocError> {
        self.inner.lock().allocate_pages(gfp, order)
    }

    pub fn deallocate_pages(&self, pfn: PageFrameNumber, order: usize) {
        self.inner.lock().deallocate_pages(pfn, order);
    }

    pub fn alloc_pages(&self, gfp: GfpFlags, order: usize) -> Option<VirtualAddress> {
        self.inner.lock().alloc_pages(gfp, order)
    }

    pub fn free_pages(&self, va: VirtualAddress, order: usize) {
        self.inner.lock().free_pages(va, order);
    }

    pub fn alloc_compound_pages(&self, gfp: GfpFlags, order: usize) -> Option<VirtualAddress> {
        self.inner.lock().alloc_compound_pages(gfp, order)
    }

    pub fn free_compound_pages(&self, va: VirtualAddress) {
        self.inner.lock().free_compound_pages(va);
    }

    #[must_use]
    pub fn into_inner(self) -> PageAllocator<'a, M> {
        self.inner.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfp::GFP_KERNEL;
    use crate::mapper::DirectMapper;
    use crate::mem_map::MemMap;
    use crate::page::PageRecord;
    use crate::page_flags::ZoneType;
    use crate::zone::DEFAULT_ZONE_LAYOUT;

    #[test]
    fn concurrent_alloc_free_restores_free_lists() {
        let base = PageFrameNumber::new(0x1000);
        let mut records = vec![PageRecord::new(ZoneType::Normal); 256];
        let mut allocator = PageAllocator::new(
            MemMap::new(base, &mut records),
            DirectMapper::default(),
            &DEFAULT_ZONE_LAYOUT,
        );
        allocator.deallocate_pages(base, 8);
        let before = allocator.snapshot(ZoneType::Normal);

        let locked = LockedPageAllocator::new(allocator);
        std::thread::scope(|s| {
            for t in 0..4 {
                let locked = &locked;
                s.spawn(move || {
                    for i in 0..100 {
                        let order = (t + i) % 4;
                        if let Some(va) = locked.alloc_pages(GFP_KERNEL, order) {
                            locked.free_pages(va, order);
                        }
                    }
                });
            }
        });

        assert_eq!(locked.lock().snapshot(ZoneType::Normal), before);
        assert_eq!(locked.into_inner().nr_free(ZoneType::Normal, 8), 1);
    }
}
