//! Feed Accumulator.
//!
//! Two ways of turning a paginated listing into a feed:
//!
//! - [`FeedAccumulator`] walks pages until it holds a target number of
//!   distinct items, the source runs dry, a fetch fails or the page ceiling
//!   is hit.
//! - [`FeedPager`] appends one page per call for infinite scrolling and
//!   refuses to overlap with itself.
//!
//! Both merge pages through [`FeedBuffer`], which keeps the first
//! occurrence of every item id.

mod accumulator;
mod pager;

pub use accumulator::{FeedAccumulation, FeedAccumulator, StopReason};
pub use pager::{FeedPager, FeedSnapshot, PageOutcome};

use std::collections::HashSet;

use reelfeed_model::{CatalogItem, ItemId};

/// Order-preserving, id-deduplicated item list.
#[derive(Debug, Clone, Default)]
pub struct FeedBuffer {
    items: Vec<CatalogItem>,
    seen: HashSet<ItemId>,
}

impl FeedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer pre-filled with `seed`, duplicates dropped.
    pub fn from_seed(seed: impl IntoIterator<Item = CatalogItem>) -> Self {
        let mut buffer = Self::new();
        buffer.extend(seed);
        buffer
    }

    /// Append items whose id has not been seen yet. Returns how many were
    /// added.
    pub fn extend(
        &mut self,
        items: impl IntoIterator<Item = CatalogItem>,
    ) -> usize {
        let before = self.items.len();
        for item in items {
            if self.seen.insert(item.id) {
                self.items.push(item);
            }
        }
        self.items.len() - before
    }

    pub fn contains(&self, id: ItemId) -> bool {
        self.seen.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CatalogItem] {
        &self.items
    }

    pub fn into_items(self) -> Vec<CatalogItem> {
        self.items
    }
}

/// First page to request when continuing from `seed_len` items, assuming
/// `per_page` items per source page.
pub(crate) fn start_page(seed_len: usize, per_page: usize) -> u32 {
    let full_pages = seed_len / per_page.max(1);
    u32::try_from(full_pages)
        .unwrap_or(u32::MAX)
        .saturating_add(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: u64) -> CatalogItem {
        CatalogItem::new(ItemId::movie(id), format!("Movie {id}"))
    }

    #[test]
    fn keeps_first_occurrence() {
        let mut buffer = FeedBuffer::from_seed([item(1), item(2), item(1)]);
        assert_eq!(buffer.len(), 2);

        let added = buffer.extend([item(2), item(3), item(3), item(4)]);
        assert_eq!(added, 2);

        let ids: Vec<u64> =
            buffer.items().iter().map(|i| i.id.tmdb_id).collect();
        assert_eq!(ids, vec![1, 2, 3, 4]);
    }

    #[test]
    fn movie_and_tv_ids_do_not_collide() {
        let mut buffer = FeedBuffer::new();
        buffer.extend([
            item(1399),
            CatalogItem::new(ItemId::tv(1399), "Game of Thrones"),
        ]);
        assert_eq!(buffer.len(), 2);
    }

    #[test]
    fn start_page_follows_seed_size() {
        assert_eq!(start_page(0, 20), 1);
        assert_eq!(start_page(19, 20), 1);
        assert_eq!(start_page(20, 20), 2);
        assert_eq!(start_page(45, 20), 3);
        assert_eq!(start_page(5, 0), 6);
    }
}
