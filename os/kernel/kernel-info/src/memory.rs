//! # Memory Layout

/// log2 of the page frame size.
pub const PAGE_SHIFT: u32 = 12;

/// Size of one page frame in bytes.
pub const PAGE_SIZE: u64 = 1 << PAGE_SHIFT;

/// Number of buddy orders. Valid orders are `0..MAX_ORDER`.
pub const MAX_ORDER: usize = 11;

/// Frames in the largest block the buddy allocator hands out.
pub const MAX_ORDER_NR_PAGES: u64 = 1 << (MAX_ORDER - 1);

/// Exclusive physical ceiling of `ZONE_DMA`.
///
/// Frames below this address belong to the DMA zone, everything at or above
/// it to the normal zone.
pub const ZONE_DMA_END: u64 = 0x0010_0000; // 1 MiB

/// Base of the kernel's direct map of physical memory.
/// Physical address `pa` is visible at `DIRECT_MAP_BASE + pa`.
pub const DIRECT_MAP_BASE: u64 = 0xffff_8880_0000_0000;

const _: () = {
    assert!(PAGE_SIZE.is_power_of_two());
    assert!(MAX_ORDER > 0 && MAX_ORDER < 32);
    assert!(ZONE_DMA_END.is_multiple_of(PAGE_SIZE));
    assert!(DIRECT_MAP_BASE.is_multiple_of(PAGE_SIZE));
};
