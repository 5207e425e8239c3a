//! # Buddy Page Allocator
//!
//! Physical page allocator for the kernel: hands out naturally aligned runs
//! of `2^order` page frames and coalesces them again when they are freed.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │             PageAllocator (façade)                  │
//! │    • allocate / free by order, by frame or address  │
//! │    • compound runs, translation, introspection      │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │              Zones and Free Areas                   │
//! │    • DMA / NORMAL frame ranges                      │
//! │    • one free list per (order, migration class)     │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │              Buddy Engine                           │
//! │    • split on allocation, merge on free             │
//! └─────────────────┬───────────────────────────────────┘
//!                   │
//! ┌─────────────────▼───────────────────────────────────┐
//! │              Page Metadata (mem map)                │
//! │    • one PageRecord per frame, indexed by frame     │
//! │    • packed flags, intrusive list link, state       │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Collaborators
//!
//! The allocator does not discover memory or map it. Both come from the
//! embedder:
//!
//! * a [`RegionProvider`] reports usable and reserved physical ranges, places
//!   the page metadata array with its bump allocator, and isolates zone ranges;
//! * a [`PhysMapper`] converts between physical and mapped virtual addresses.
//!
//! ## Usage
//!
//! ```ignore
//! use kernel_page_alloc::{DEFAULT_ZONE_LAYOUT, DirectMapper, GFP_KERNEL, PageAllocator};
//!
//! let (mut pages, released) =
//!     unsafe { PageAllocator::bootstrap(&mut memblock, DirectMapper::default(), &DEFAULT_ZONE_LAYOUT)? };
//! log::info!("{released} frames under management");
//!
//! let va = pages.alloc_pages(GFP_KERNEL, 2).ok_or(OutOfMemory)?;
//! // ... use 16 KiB at `va` ...
//! pages.free_pages(va, 2);
//! ```
//!
//! ## Concurrency
//!
//! Every mutating entry point takes `&mut self`, so a single owner needs no
//! locking. [`LockedPageAllocator`] wraps one instance in a spin lock for
//! shared use.
//!
//! ## Caller Obligations
//!
//! Blocks are freed once, with the order they were allocated with. Violations
//! corrupt the free lists; debug builds assert on the detectable cases.

#![cfg_attr(not(any(test, doctest)), no_std)]

mod allocator;
mod bootstrap;
mod buddy;
mod compound;
mod free_list;
mod gfp;
mod locked;
mod mapper;
mod mem_map;
mod page;
mod page_flags;
mod zone;

pub use allocator::{AllocError, PageAllocator};
pub use bootstrap::{BootstrapError, IsolationError, RegionProvider};
pub use free_list::FreeList;
pub use gfp::{GFP_KERNEL, GfpFlags};
pub use locked::LockedPageAllocator;
pub use mapper::{DirectMapper, PhysMapper};
pub use mem_map::MemMap;
pub use page::{ListLink, PageRecord, PageState};
pub use page_flags::{
    MAX_NR_ZONES, MIGRATE_TYPES, MIGRATETYPE_PGOFF, MigrateType, PageFlags, ZONES_PGOFF, ZoneType,
};
pub use zone::{DEFAULT_ZONE_LAYOUT, FreeArea, FreeAreaSnapshot, Zone, ZoneLayout};

pub use kernel_info::memory::MAX_ORDER;
pub use kernel_memory_addresses::{PageFrameNumber, PhysicalAddress, PhysicalRange, VirtualAddress};
