//! # Physical/Virtual Translation
//!
//! The allocator hands out and takes back *virtual* addresses but tracks
//! *physical* frames. A [`PhysMapper`] converts between the two for whatever
//! mapping the embedder runs under: a kernel direct map, an identity map in
//! a loader, or host memory in tests.
//!
//! [`DirectMapper`] implements the usual kernel layout where all physical
//! memory is mapped linearly at a fixed offset:
//!
//! ```text
//! va = pa + offset        pa = va - offset
//! ```

use kernel_info::memory::DIRECT_MAP_BASE;
use kernel_memory_addresses::{PhysicalAddress, VirtualAddress};

pub trait PhysMapper {
    /// Virtual address through which `pa` is reachable.
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress;

    /// Physical address backing `va`.
    ///
    /// Only meaningful for addresses previously produced by
    /// [`phys_to_virt`](Self::phys_to_virt).
    fn virt_to_phys(&self, va: VirtualAddress) -> PhysicalAddress;
}

/// [`PhysMapper`] for a linear direct map at `offset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DirectMapper {
    offset: u64,
}

impl DirectMapper {
    #[must_use]
    pub const fn new(offset: u64) -> Self {
        Self { offset }
    }

    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.offset
    }
}

impl Default for DirectMapper {
    fn default() -> Self {
        Self::new(DIRECT_MAP_BASE)
    }
}

impl PhysMapper for DirectMapper {
    fn phys_to_virt(&self, pa: PhysicalAddress) -> VirtualAddress {
        VirtualAddress::new(pa.as_u64().wrapping_add(self.offset))
    }

    fn virt_to_phys(&self, va: VirtualAddress) -> PhysicalAddress {
        PhysicalAddress::new(va.as_u64().wrapping_sub(self.offset))
    }
}
