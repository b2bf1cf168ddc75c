use crate::utils::constants::PAGE_SIZE;

/// Fixed-size pages over `len` reviews
///
/// An empty table still has one (empty) page, and moving past either end is
/// a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pager {
    len: usize,
    page: usize,
}

impl Pager {
    pub fn new(len: usize) -> Self {
        Self { len, page: 0 }
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        self.len.div_ceil(PAGE_SIZE).max(1)
    }

    pub fn next(&mut self) -> bool {
        if self.page + 1 < self.page_count() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn prev(&mut self) -> bool {
        if self.page > 0 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    /// Review index bound to `slot` on the current page, if any
    pub fn index_for_slot(&self, slot: usize) -> Option<usize> {
        if slot >= PAGE_SIZE {
            return None;
        }
        let index = self.page * PAGE_SIZE + slot;
        (index < self.len).then_some(index)
    }

    /// Number of filled slots on the current page
    pub fn visible(&self) -> usize {
        (0..PAGE_SIZE)
            .filter(|&slot| self.index_for_slot(slot).is_some())
            .count()
    }
}
