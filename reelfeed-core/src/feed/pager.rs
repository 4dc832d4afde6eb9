use std::{
    fmt,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
};

use reelfeed_model::{CatalogItem, MediaKind};
use tracing::{debug, trace, warn};

use super::FeedBuffer;
use crate::catalog::CatalogClient;

/// Outcome of one [`FeedPager::next_page`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageOutcome {
    Appended { page: u32, added: usize },
    /// No more pages; nothing was requested or the source ran dry.
    Exhausted,
    /// The fetch failed. Treated as the end of the feed until
    /// [`FeedPager::reset`].
    Failed,
    /// Another fetch was already in flight; this call did nothing.
    Busy,
}

/// Point-in-time copy of the pager's feed.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSnapshot {
    pub items: Vec<CatalogItem>,
    pub next_page: u32,
    pub has_more: bool,
    pub fetching: bool,
}

#[derive(Debug)]
struct PagerState {
    buffer: FeedBuffer,
    next_page: u32,
    has_more: bool,
}

impl Default for PagerState {
    fn default() -> Self {
        Self {
            buffer: FeedBuffer::new(),
            next_page: 1,
            has_more: true,
        }
    }
}

/// Clears the in-flight flag even if the fetching future is dropped.
struct InFlight<'a>(&'a AtomicBool);

impl<'a> InFlight<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlight(flag))
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Incremental, one-page-per-call feed for infinite scrolling.
pub struct FeedPager {
    client: Arc<dyn CatalogClient>,
    kind: MediaKind,
    fetching: AtomicBool,
    state: Mutex<PagerState>,
}

impl fmt::Debug for FeedPager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.lock();
        f.debug_struct("FeedPager")
            .field("kind", &self.kind)
            .field("fetching", &self.is_fetching())
            .field("items", &state.buffer.len())
            .field("next_page", &state.next_page)
            .field("has_more", &state.has_more)
            .finish()
    }
}

impl FeedPager {
    pub fn new(client: Arc<dyn CatalogClient>, kind: MediaKind) -> Self {
        Self {
            client,
            kind,
            fetching: AtomicBool::new(false),
            state: Mutex::new(PagerState::default()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, PagerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_fetching(&self) -> bool {
        self.fetching.load(Ordering::Acquire)
    }

    pub fn has_more(&self) -> bool {
        self.lock().has_more
    }

    pub fn len(&self) -> usize {
        self.lock().buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().buffer.is_empty()
    }

    /// Fetch and append the next page. Calls made while a fetch is in
    /// flight return [`PageOutcome::Busy`] without touching the source.
    pub async fn next_page(&self) -> PageOutcome {
        let Some(_in_flight) = InFlight::acquire(&self.fetching) else {
            trace!("{} page fetch already in flight", self.kind);
            return PageOutcome::Busy;
        };

        let page = {
            let state = self.lock();
            if !state.has_more {
                return PageOutcome::Exhausted;
            }
            state.next_page
        };

        let result = self.client.list_popular(self.kind, page).await;

        let mut state = self.lock();
        match result {
            Ok(fetched) if !fetched.is_empty() => {
                let last = fetched.is_last();
                let added = state.buffer.extend(fetched.items);
                state.next_page = page.saturating_add(1);
                state.has_more = !last;
                debug!(
                    "{} page {} appended {} ({} total)",
                    self.kind,
                    page,
                    added,
                    state.buffer.len()
                );
                PageOutcome::Appended { page, added }
            }
            Ok(_) => {
                debug!("{} listing exhausted at page {}", self.kind, page);
                state.has_more = false;
                PageOutcome::Exhausted
            }
            Err(e) => {
                warn!("{} page {} failed: {}", self.kind, page, e);
                state.has_more = false;
                PageOutcome::Failed
            }
        }
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        let state = self.lock();
        FeedSnapshot {
            items: state.buffer.items().to_vec(),
            next_page: state.next_page,
            has_more: state.has_more,
            fetching: self.is_fetching(),
        }
    }

    /// Drop everything and start again from page 1.
    pub fn reset(&self) {
        *self.lock() = PagerState::default();
    }
}
