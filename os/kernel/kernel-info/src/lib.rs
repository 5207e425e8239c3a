//! # Physical Memory Configuration
//!
//! Compile-time constants that shape the physical page allocator: page
//! geometry, the buddy order limit, the zone ceilings, and the offset of the
//! kernel's direct map. Every constant is fixed at build time and validated by
//! `const` assertions, so an inconsistent configuration fails to compile
//! instead of corrupting the allocator at boot.
//!
//! ## Physical Memory Zones
//!
//! ```text
//! 0x0000_0000 ┌─────────────────────────────────┐
//!             │          ZONE_DMA               │
//!             │  (legacy low memory, < 1 MiB)   │
//! ZONE_DMA_END├─────────────────────────────────┤ 0x0010_0000 (1 MiB)
//!             │          ZONE_NORMAL            │
//!             │  (everything else, managed by   │
//!             │   the buddy allocator)          │
//!             └─────────────────────────────────┘
//! ```
//!
//! ## Buddy Orders
//!
//! An order-`n` block spans `2^n` naturally aligned frames. Orders range over
//! `0..MAX_ORDER`, so the largest block is [`memory::MAX_ORDER_NR_PAGES`]
//! frames (4 MiB with the default 4 KiB pages and `MAX_ORDER = 11`).
//!
//! ## Usage
//!
//! ```rust
//! use kernel_info::memory::{MAX_ORDER, PAGE_SHIFT, PAGE_SIZE};
//!
//! assert_eq!(PAGE_SIZE, 1 << PAGE_SHIFT);
//! assert_eq!(MAX_ORDER, 11);
//! ```

#![cfg_attr(not(any(test, doctest)), no_std)]
#![deny(unsafe_code)]

pub mod memory;
