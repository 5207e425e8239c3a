//! # Buddy Split and Merge
//!
//! The block of order `k` starting at frame `F` (with `F` a multiple of `2^k`)
//! has its buddy at `F ^ 2^k`; the two together form the order `k + 1` block
//! at `F & !2^k`.
//!
//! Allocation takes the smallest free block of at least the requested order
//! and [`expand`]s it, returning the upper halves to the free lists until a
//! block of exactly the requested order remains:
//!
//! ```text
//! order 3 block at F, want order 1:
//!   ┌───────────────────────────────┐
//!   │ F             order 3         │
//!   └───────────────────────────────┘
//!   ┌───────┬───────┬───────────────┐
//!   │ F  o1 │F+2 o1 │ F+4    o2     │   F+4 (o2) and F+2 (o1) go back
//!   └───────┴───────┴───────────────┘
//! ```
//!
//! Freeing runs the inverse: while the buddy is a free block of the same
//! order in the same zone, unlink it and continue one order up.

use crate::mem_map::MemMap;
use crate::page::PageState;
use crate::page_flags::{MigrateType, ZoneType};
use crate::zone::Zone;
use kernel_info::memory::MAX_ORDER;
use kernel_memory_addresses::PageFrameNumber;
use log::trace;

/// Put the free order-`order` block at `pfn` on its free list.
pub fn add_to_free_area(
    zone: &mut Zone,
    map: &mut MemMap<'_>,
    pfn: PageFrameNumber,
    order: usize,
    migratetype: MigrateType,
) {
    let area = &mut zone.free_area[order];
    area.free_list[migratetype.index()].push_front(map, pfn);
    area.nr_free += 1;

    let page = &mut map[pfn];
    page.set_buddy();
    page.set_migratetype(migratetype);
    page.set_state(PageState::Free { order });
}

/// Take the free order-`order` block at `pfn` off its free list.
pub fn del_from_free_area(zone: &mut Zone, map: &mut MemMap<'_>, pfn: PageFrameNumber, order: usize) {
    debug_assert_eq!(map[pfn].free_order(), Some(order), "frame {pfn} is not a free order-{order} block");
    let migratetype = map[pfn].migratetype();

    let area = &mut zone.free_area[order];
    area.free_list[migratetype.index()].remove(map, pfn);
    area.nr_free -= 1;

    let page = &mut map[pfn];
    page.clear_buddy();
    page.set_state(PageState::Allocated);
}

/// Split the order-`high` block at `pfn` down to order `low`.
///
/// The block must already be off its free list. The upper half of every split
/// goes back to the free lists; the order-`low` block at `pfn` stays with the
/// caller.
pub fn expand(
    zone: &mut Zone,
    map: &mut MemMap<'_>,
    pfn: PageFrameNumber,
    low: usize,
    mut high: usize,
    migratetype: MigrateType,
) {
    while high > low {
        high -= 1;
        let upper = pfn + (1u64 << high);
        trace!("split: {pfn} -> order {high} upper half at {upper}");
        add_to_free_area(zone, map, upper, high, migratetype);
    }
}

/// Remove a block of exactly `order` from `zone`, splitting larger blocks as needed.
pub fn rmqueue(
    zone: &mut Zone,
    map: &mut MemMap<'_>,
    order: usize,
    migratetype: MigrateType,
) -> Option<PageFrameNumber> {
    for current in order..MAX_ORDER {
        let Some(pfn) = zone.free_area[current].list(migratetype).first() else {
            continue;
        };
        del_from_free_area(zone, map, pfn, current);
        expand(zone, map, pfn, order, current, migratetype);
        return Some(pfn);
    }
    None
}

/// Whether `buddy` may be merged with an order-`order` block in `zone`.
///
/// The buddy must have a record, be the head of a free block of exactly the
/// same order, and belong to the same zone.
fn page_is_buddy(map: &MemMap<'_>, buddy: PageFrameNumber, order: usize, zone: ZoneType) -> bool {
    map.get(buddy).is_some_and(|page| {
        page.is_buddy() && page.free_order() == Some(order) && page.zone() == zone
    })
}

/// Return the order-`order` block at `pfn` to `zone`, coalescing with free buddies.
pub fn free_one(
    zone: &mut Zone,
    map: &mut MemMap<'_>,
    mut pfn: PageFrameNumber,
    mut order: usize,
    migratetype: MigrateType,
) {
    debug_assert!(pfn.is_aligned(order), "frame {pfn} is not order-{order} aligned");
    debug_assert!(!map[pfn].is_buddy(), "frame {pfn} is already free");

    let zone_type = zone.zone_type();
    while order < MAX_ORDER - 1 {
        let buddy = pfn.buddy(order);
        if !page_is_buddy(map, buddy, order, zone_type) {
            break;
        }
        del_from_free_area(zone, map, buddy, order);
        let parent = pfn.parent(order);
        trace!("merge: {pfn} + {buddy} -> order {} at {parent}", order + 1);
        pfn = parent;
        order += 1;
    }
    add_to_free_area(zone, map, pfn, order, migratetype);
}
