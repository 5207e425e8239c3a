//! Allocation request flags.
//!
//! [`GfpFlags`] is opaque to callers; the allocator maps it to a zone and a
//! migration class. Every request currently lands in [`ZoneType::Normal`] as
//! [`MigrateType::Unmovable`].

use crate::page_flags::{MigrateType, ZoneType};
use core::fmt;
use core::ops::BitOr;

#[derive(Copy, Clone, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct GfpFlags(u32);

/// Regular kernel allocation.
pub const GFP_KERNEL: GfpFlags = GfpFlags(0);

impl GfpFlags {
    #[must_use]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[must_use]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Zone a request with these flags is served from.
    #[must_use]
    pub const fn zone_type(self) -> ZoneType {
        ZoneType::Normal
    }

    /// Free-list class a request with these flags draws from.
    #[must_use]
    pub const fn migratetype(self) -> MigrateType {
        MigrateType::Unmovable
    }
}

impl BitOr for GfpFlags {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl fmt::Debug for GfpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GfpFlags({:#x})", self.0)
    }
}
