//! # Page Metadata Array
//!
//! [`MemMap`] is the arena of [`PageRecord`]s, one per frame in
//! `[base_pfn, base_pfn + len)`. Records are addressed by frame number; a
//! frame number doubles as the handle to its record, so no raw pointer to a
//! record ever leaves this module.
//!
//! ```text
//!   records[0]      records[1]            records[len - 1]
//! ┌──────────────┬──────────────┬─────┬──────────────┐
//! │ PFN base_pfn │ base_pfn + 1 │ ... │ end_pfn - 1  │
//! └──────────────┴──────────────┴─────┴──────────────┘
//! ```

use crate::page::PageRecord;
use core::ops::{Index, IndexMut};
use kernel_memory_addresses::PageFrameNumber;

pub struct MemMap<'a> {
    base: PageFrameNumber,
    records: &'a mut [PageRecord],
}

impl<'a> MemMap<'a> {
    /// Wrap an initialized record array whose first entry describes `base`.
    #[must_use]
    pub const fn new(base: PageFrameNumber, records: &'a mut [PageRecord]) -> Self {
        Self { base, records }
    }

    /// Lowest tracked frame.
    #[inline]
    #[must_use]
    pub const fn base_pfn(&self) -> PageFrameNumber {
        self.base
    }

    /// One past the highest tracked frame.
    #[inline]
    #[must_use]
    pub const fn end_pfn(&self) -> PageFrameNumber {
        PageFrameNumber::new(self.base.as_u64() + self.records.len() as u64)
    }

    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    fn index_of(&self, pfn: PageFrameNumber) -> Option<usize> {
        let offset = usize::try_from(pfn.distance_from(self.base)?).ok()?;
        (offset < self.records.len()).then_some(offset)
    }

    /// Whether `pfn` has a record.
    #[inline]
    #[must_use]
    pub fn contains(&self, pfn: PageFrameNumber) -> bool {
        self.index_of(pfn).is_some()
    }

    /// Record of `pfn` (`pfn_to_page`).
    #[inline]
    #[must_use]
    pub fn get(&self, pfn: PageFrameNumber) -> Option<&PageRecord> {
        self.index_of(pfn).map(|i| &self.records[i])
    }

    #[inline]
    pub fn get_mut(&mut self, pfn: PageFrameNumber) -> Option<&mut PageRecord> {
        self.index_of(pfn).map(|i| &mut self.records[i])
    }

    /// Frame described by `page` (`page_to_pfn`).
    ///
    /// Returns `None` for a record that does not live in this array.
    #[must_use]
    pub fn pfn_of(&self, page: &PageRecord) -> Option<PageFrameNumber> {
        let start = self.records.as_ptr() as usize;
        let offset = (core::ptr::from_ref(page) as usize).checked_sub(start)?;
        let stride = size_of::<PageRecord>();
        let index = offset / stride;
        (offset % stride == 0 && index < self.records.len()).then(|| self.base + index as u64)
    }

    /// Records of the `2^order` frames starting at `pfn`.
    ///
    /// # Panics
    /// If the run is not fully covered by the array.
    pub(crate) fn run_mut(&mut self, pfn: PageFrameNumber, order: usize) -> &mut [PageRecord] {
        let Some(start) = self.index_of(pfn) else {
            panic!("compound run at {pfn} is not covered by the mem map");
        };
        &mut self.records[start..start + (1 << order)]
    }

    /// All records with their frame numbers, ascending.
    pub fn iter(&self) -> impl Iterator<Item = (PageFrameNumber, &PageRecord)> + '_ {
        self.records
            .iter()
            .enumerate()
            .map(|(i, page)| (self.base + i as u64, page))
    }
}

impl Index<PageFrameNumber> for MemMap<'_> {
    type Output = PageRecord;

    fn index(&self, pfn: PageFrameNumber) -> &PageRecord {
        let Some(page) = self.get(pfn) else {
            panic!("frame {pfn} is not covered by the mem map");
        };
        page
    }
}

impl IndexMut<PageFrameNumber> for MemMap<'_> {
    fn index_mut(&mut self, pfn: PageFrameNumber) -> &mut PageRecord {
        let Some(i) = self.index_of(pfn) else {
            panic!("frame {pfn} is not covered by the mem map");
        };
        &mut self.records[i]
    }
}
