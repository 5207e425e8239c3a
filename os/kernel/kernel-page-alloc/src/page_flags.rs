//! # Packed Page Flags
//!
//! Every page record carries one `u64` flags word:
//!
//! ```text
//!  63     62            61 .. 4     3        2      1       0
//! ┌──────┬─────────────┬──────────┬────────┬──────┬───────┬────────┐
//! │ ZONE │ MIGRATETYPE │ reserved │compound│ slab │ buddy │ locked │
//! └──────┴─────────────┴──────────┴────────┴──────┴───────┴────────┘
//! ```
//!
//! The section field above `ZONE` is zero bits wide in this configuration.
//! Widths of `ZONE` and `MIGRATETYPE` are the number of bits needed for
//! [`MAX_NR_ZONES`] and [`MIGRATE_TYPES`] values. Each setter replaces exactly
//! its own bit range, so the fields can be written in any order.

use bitfield_struct::bitfield;
use core::fmt;

/// Number of zones.
pub const MAX_NR_ZONES: usize = 2;

/// Number of migration classes.
pub const MIGRATE_TYPES: usize = 2;

/// Bit offset of the zone field.
pub const ZONES_PGOFF: u32 = 63;

/// Bit offset of the migration class field.
pub const MIGRATETYPE_PGOFF: u32 = 62;

/// Physical memory zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ZoneType {
    /// Low memory usable by legacy DMA engines.
    Dma = 0,
    /// Normal addressable memory.
    Normal = 1,
}

impl ZoneType {
    /// All zones in ascending physical order.
    pub const ALL: [Self; MAX_NR_ZONES] = [Self::Dma, Self::Normal];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Dma => "DMA",
            Self::Normal => "Normal",
        }
    }

    const fn into_bits(self) -> u8 {
        self as u8
    }

    const fn from_bits(value: u8) -> Self {
        match value {
            0 => Self::Dma,
            _ => Self::Normal,
        }
    }
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Migration class: intended movability of a block's contents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum MigrateType {
    Unmovable = 0,
    Movable = 1,
}

impl MigrateType {
    pub const ALL: [Self; MIGRATE_TYPES] = [Self::Unmovable, Self::Movable];

    #[inline]
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unmovable => "unmovable",
            Self::Movable => "movable",
        }
    }

    const fn into_bits(self) -> u8 {
        self as u8
    }

    const fn from_bits(value: u8) -> Self {
        match value {
            0 => Self::Unmovable,
            _ => Self::Movable,
        }
    }
}

impl fmt::Display for MigrateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-frame flags word.
#[bitfield(u64)]
#[derive(PartialEq, Eq)]
pub struct PageFlags {
    /// **Locked** (bit 0): the frame is pinned by its owner.
    pub locked: bool,

    /// **Buddy** (bit 1): the frame starts a block on a buddy free list.
    pub buddy: bool,

    /// **Slab** (bit 2): the frame is owned by an object allocator.
    pub slab: bool,

    /// **Compound** (bit 3): the frame belongs to a compound run.
    pub compound: bool,

    /// (bits 4..61): reserved.
    #[bits(58)]
    __: u64,

    /// **Migration class** (bit 62).
    #[bits(1)]
    pub migratetype: MigrateType,

    /// **Zone** (bit 63). Written once at bootstrap.
    #[bits(1)]
    pub zone: ZoneType,
}
