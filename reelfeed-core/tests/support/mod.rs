//! Scripted catalog for integration tests.
#![allow(dead_code)]

use std::{
    collections::{HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use reelfeed_core::{CatalogClient, CatalogError};
use reelfeed_core::model::{CatalogItem, CatalogPage, ItemId, MediaKind, VideoEntry};
use tokio::sync::Semaphore;

/// In-memory catalog. Page `n` holds ids `(n-1)*per_page .. n*per_page`.
/// When gated, every request blocks until the test releases a permit.
pub struct FakeCatalog {
    per_page: u64,
    total_pages: u32,
    empty_after: Option<u32>,
    failing_pages: HashSet<u32>,
    videos: HashMap<ItemId, Vec<VideoEntry>>,
    detail_failures: AtomicUsize,
    gate: Option<Semaphore>,
    detail_calls: AtomicUsize,
    page_calls: AtomicUsize,
}

impl Default for FakeCatalog {
    fn default() -> Self {
        Self {
            per_page: 20,
            total_pages: 500,
            empty_after: None,
            failing_pages: HashSet::new(),
            videos: HashMap::new(),
            detail_failures: AtomicUsize::new(0),
            gate: None,
            detail_calls: AtomicUsize::new(0),
            page_calls: AtomicUsize::new(0),
        }
    }
}

impl FakeCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn per_page(mut self, per_page: u64) -> Self {
        self.per_page = per_page;
        self
    }

    pub fn total_pages(mut self, total: u32) -> Self {
        self.total_pages = total;
        self
    }

    /// Pages after `page` come back empty.
    pub fn empty_after(mut self, page: u32) -> Self {
        self.empty_after = Some(page);
        self
    }

    pub fn failing_page(mut self, page: u32) -> Self {
        self.failing_pages.insert(page);
        self
    }

    pub fn with_trailer(mut self, id: ItemId, key: &str) -> Self {
        self.videos
            .insert(id, vec![VideoEntry::new("Trailer", "YouTube", key)]);
        self
    }

    /// The next `n` detail lookups fail with a 503.
    pub fn failing_details(self, n: usize) -> Self {
        self.detail_failures.store(n, Ordering::SeqCst);
        self
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    pub fn build(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// Let `n` blocked requests through.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn detail_calls(&self) -> usize {
        self.detail_calls.load(Ordering::SeqCst)
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub async fn wait_for_detail_calls(&self, n: usize) {
        wait_until(|| self.detail_calls() >= n).await;
    }

    pub async fn wait_for_page_calls(&self, n: usize) {
        wait_until(|| self.page_calls() >= n).await;
    }

    async fn pass_gate(&self) {
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }
    }
}

async fn wait_until(done: impl Fn() -> bool) {
    tokio::time::timeout(Duration::from_secs(5), async {
        while !done() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("condition not reached in time");
}

#[async_trait]
impl CatalogClient for FakeCatalog {
    async fn list_popular(
        &self,
        kind: MediaKind,
        page: u32,
    ) -> Result<CatalogPage, CatalogError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;

        if self.failing_pages.contains(&page) {
            return Err(CatalogError::Status {
                status: 500,
                endpoint: format!("/{kind}/popular"),
            });
        }

        let empty = page > self.total_pages
            || self.empty_after.is_some_and(|last| page > last);
        let items = if empty {
            Vec::new()
        } else {
            let start = u64::from(page - 1) * self.per_page;
            (start..start + self.per_page)
                .map(|id| {
                    CatalogItem::new(ItemId::new(kind, id), format!("Title {id}"))
                        .with_poster(format!("/poster-{id}.jpg"))
                })
                .collect()
        };

        Ok(CatalogPage {
            page,
            total_pages: self.total_pages,
            items,
        })
    }

    async fn get_detail(&self, id: ItemId) -> Result<CatalogItem, CatalogError> {
        self.detail_calls.fetch_add(1, Ordering::SeqCst);
        self.pass_gate().await;

        let failing = self
            .detail_failures
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(CatalogError::Status {
                status: 503,
                endpoint: format!("/{}/{}", id.kind, id.tmdb_id),
            });
        }

        let videos = self.videos.get(&id).cloned().unwrap_or_default();
        Ok(CatalogItem::new(id, format!("Title {}", id.tmdb_id)).with_videos(videos))
    }
}
