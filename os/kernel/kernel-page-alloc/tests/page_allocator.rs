mod common;

use common::{Memblock, TestRam, boot};
use kernel_page_alloc::{
    AllocError, DirectMapper, GFP_KERNEL, MAX_ORDER, MigrateType, PageAllocator, PageFrameNumber, PageState,
    VirtualAddress, ZoneType,
};

const RAM_START: u64 = 0x8_0000;
const RAM_END: u64 = 0x11_0000;
const POOL: (u64, u64) = (0x8_0000, 0x9_0000);

fn pfn(raw: u64) -> PageFrameNumber {
    PageFrameNumber::new(raw)
}

/// One usable range `[0x100000, 0x110000)`: sixteen frames.
fn sixteen_frames() -> (TestRam, Memblock) {
    let ram = TestRam::new(RAM_START, RAM_END);
    let memblock = Memblock::new(&[(0x10_0000, 0x11_0000)]).with_pool(POOL.0, POOL.1);
    (ram, memblock)
}

fn nr_free(pages: &PageAllocator<'_, DirectMapper>) -> Vec<usize> {
    (0..MAX_ORDER).map(|order| pages.nr_free(ZoneType::Normal, order)).collect()
}

#[test]
fn bootstrap_releases_one_order_four_block() {
    let (mut ram, mut memblock) = sixteen_frames();
    let (pages, released) = boot(&mut ram, &mut memblock).expect("bootstrap");

    assert_eq!(released, 16);
    let mut expected = vec![0; MAX_ORDER];
    expected[4] = 1;
    assert_eq!(nr_free(&pages), expected);
    assert_eq!(pages.free_list_len(ZoneType::Normal, 4, MigrateType::Unmovable), 1);
    assert_eq!(pages.pfn_to_page(pfn(0x100)).map(|p| p.state()), Some(PageState::Free { order: 4 }));
}

#[test]
fn successive_splits_leave_expected_leftovers() {
    let (mut ram, mut memblock) = sixteen_frames();
    let (mut pages, _) = boot(&mut ram, &mut memblock).expect("bootstrap");

    let got: Vec<_> = [0, 0, 0, 1]
        .into_iter()
        .map(|order| pages.allocate_pages(GFP_KERNEL, order).expect("free block"))
        .collect();
    assert_eq!(got, [pfn(0x100), pfn(0x101), pfn(0x102), pfn(0x104)]);

    // 0x103 (order 0), 0x106 (order 1) and 0x108 (order 3) remain.
    assert_eq!(&nr_free(&pages)[..5], [1, 1, 0, 1, 0]);
    for (frame, order) in [(0x103, 0), (0x106, 1), (0x108, 3)] {
        let page = pages.pfn_to_page(pfn(frame)).expect("tracked");
        assert_eq!(page.free_order(), Some(order));
        assert!(page.is_buddy());
    }
    for frame in &got {
        assert!(!pages.pfn_to_page(*frame).expect("tracked").is_buddy());
    }
}

#[test]
fn reverse_frees_coalesce_back_to_bootstrap_state() {
    let (mut ram, mut memblock) = sixteen_frames();
    let (mut pages, _) = boot(&mut ram, &mut memblock).expect("bootstrap");
    let after_boot = pages.snapshot(ZoneType::Normal);

    let blocks: Vec<_> = [0, 0, 0, 1]
        .into_iter()
        .map(|order| (pages.alloc_pages(GFP_KERNEL, order).expect("free block"), order))
        .collect();
    for &(va, order) in blocks.iter().rev() {
        pages.free_pages(va, order);
    }

    assert_eq!(pages.snapshot(ZoneType::Normal), after_boot);
    assert_eq!(pages.snapshot(ZoneType::Normal).free_pages(), 16);
}

#[test]
fn allocate_then_free_restores_occupancy() {
    let (mut ram, mut memblock) = sixteen_frames();
    let (mut pages, _) = boot(&mut ram, &mut memblock).expect("bootstrap");
    let _held = pages.allocate_pages(GFP_KERNEL, 0).expect("free block");

    for order in 0..4 {
        let before = pages.snapshot(ZoneType::Normal);
        let pfn = pages.allocate_pages(GFP_KERNEL, order).expect("free block");
        pages.deallocate_pages(pfn, order);
        assert_eq!(pages.snapshot(ZoneType::Normal), before, "order {order}");
    }
}

#[test]
fn exhaustion_returns_failure() {
    let (mut ram, mut memblock) = sixteen_frames();
    let (mut pages, _) = boot(&mut ram, &mut memblock).expect("bootstrap");

    assert_eq!(
        pages.allocate_pages(GFP_KERNEL, 5),
        Err(AllocError::OutOfMemory { order: 5 })
    );
    assert_eq!(
        pages.allocate_pages(GFP_KERNEL, MAX_ORDER),
        Err(AllocError::InvalidOrder { order: MAX_ORDER })
    );

    // A frame of the upper half stays held, so the halves cannot merge.
    let a = pages.allocate_pages(GFP_KERNEL, 3).expect("free block");
    let _b = pages.allocate_pages(GFP_KERNEL, 0).expect("free block");
    pages.deallocate_pages(a, 3);
    assert_eq!(pages.alloc_pages(GFP_KERNEL, 4), None);
    assert!(pages.alloc_pages(GFP_KERNEL, 3).is_some());
}

#[test]
fn pages_run_dry_one_by_one() {
    let (mut ram, mut memblock) = sixteen_frames();
    let (mut pages, _) = boot(&mut ram, &mut memblock).expect("bootstrap");

    let mut held = Vec::new();
    while let Some(va) = pages.alloc_page(GFP_KERNEL) {
        held.push(va);
    }
    assert_eq!(held.len(), 16);
    assert_eq!(pages.free_pages_total(), 0);

    for va in held {
        pages.free_page(va);
    }
    assert_eq!(pages.nr_free(ZoneType::Normal, 4), 1);
}

#[test]
fn allocated_memory_is_usable() {
    let (mut ram, mut memblock) = sixteen_frames();
    let (mut pages, _) = boot(&mut ram, &mut memblock).expect("bootstrap");

    let a = pages.alloc_pages(GFP_KERNEL, 1).expect("free block");
    let b = pages.alloc_pages(GFP_KERNEL, 1).expect("free block");
    assert_eq!(b.as_u64() - a.as_u64(), 2 * 4096);

    let len = 2 * 4096;
    // SAFETY: both blocks are owned, mapped and 8 KiB long.
    unsafe {
        core::ptr::write_bytes(a.as_mut_ptr::<u8>(), 0xa5, len);
        core::ptr::write_bytes(b.as_mut_ptr::<u8>(), 0x5a, len);
        let a = core::slice::from_raw_parts(a.as_ptr::<u8>(), len);
        let b = core::slice::from_raw_parts(b.as_ptr::<u8>(), len);
        assert!(a.iter().all(|&x| x == 0xa5));
        assert!(b.iter().all(|&x| x == 0x5a));
    }

    pages.free_pages(a, 1);
    pages.free_pages(b, 1);
    assert_eq!(pages.nr_free(ZoneType::Normal, 4), 1);
}

#[test]
fn null_free_is_a_no_op() {
    let (mut ram, mut memblock) = sixteen_frames();
    let (mut pages, _) = boot(&mut ram, &mut memblock).expect("bootstrap");
    let before = pages.snapshot(ZoneType::Normal);

    pages.free_pages(VirtualAddress::null(), 0);
    pages.free_page(VirtualAddress::null());
    pages.free_compound_pages(VirtualAddress::null());
    assert_eq!(pages.snapshot(ZoneType::Normal), before);
}

#[test]
fn address_translations_round_trip() {
    let (mut ram, mut memblock) = sixteen_frames();
    let (mut pages, _) = boot(&mut ram, &mut memblock).expect("bootstrap");
    let va = pages.alloc_pages(GFP_KERNEL, 2).expect("free block");

    let page = pages.virt_to_page(va).expect("tracked");
    let frame = pages.page_to_pfn(page).expect("in mem map");
    assert_eq!(frame, pfn(0x100));
    assert_eq!(pages.page_to_virt(page), Some(va));
    assert_eq!(pages.page_address(frame), va);
    assert_eq!(pages.page_to_phys(page).map(|pa| pa.as_u64()), Some(0x10_0000));
    assert_eq!(pages.virt_to_head_page(va + 4096), Some(pfn(0x101)));
}
