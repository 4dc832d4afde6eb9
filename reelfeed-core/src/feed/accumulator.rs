use std::{fmt, sync::Arc};

use rand::seq::SliceRandom;
use reelfeed_model::{CatalogItem, MediaKind};
use tracing::{debug, info, warn};

use super::{FeedBuffer, start_page};
use crate::{
    catalog::CatalogClient,
    config::{FeedConfig, FeedOrder},
};

/// Why an accumulation run stopped requesting pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StopReason {
    TargetReached,
    /// The source returned an empty page or its last page.
    Exhausted,
    PageCeiling,
    /// A page fetch failed; the items gathered so far are kept.
    Failed,
}

/// Result of one [`FeedAccumulator::accumulate`] run.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedAccumulation {
    pub items: Vec<CatalogItem>,
    pub pages_fetched: u32,
    /// Page a follow-up run would request first.
    pub next_page: u32,
    pub stop: StopReason,
}

impl FeedAccumulation {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Whether the source may still have pages this run did not request.
    pub fn has_more(&self) -> bool {
        matches!(self.stop, StopReason::TargetReached | StopReason::PageCeiling)
    }
}

/// Builds a bounded feed of distinct items from a paginated listing.
#[derive(Clone)]
pub struct FeedAccumulator {
    client: Arc<dyn CatalogClient>,
    kind: MediaKind,
    config: FeedConfig,
}

impl fmt::Debug for FeedAccumulator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedAccumulator")
            .field("kind", &self.kind)
            .field("config", &self.config)
            .finish()
    }
}

impl FeedAccumulator {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        kind: MediaKind,
        config: FeedConfig,
    ) -> Self {
        Self {
            client,
            kind,
            config,
        }
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    /// Accumulate up to `target_size` distinct items, continuing from
    /// `seed`. Never fails: a fetch error ends the run with whatever was
    /// gathered.
    pub async fn accumulate(
        &self,
        target_size: usize,
        seed: Vec<CatalogItem>,
    ) -> FeedAccumulation {
        let mut buffer = FeedBuffer::from_seed(seed);
        let mut page = start_page(buffer.len(), self.config.items_per_page_hint);
        let mut pages_fetched = 0u32;

        let stop = loop {
            if buffer.len() >= target_size {
                break StopReason::TargetReached;
            }
            if pages_fetched >= self.config.max_pages {
                break StopReason::PageCeiling;
            }

            let fetched = match self.client.list_popular(self.kind, page).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    warn!(
                        "{} page {} failed, keeping partial feed: {}",
                        self.kind, page, e
                    );
                    break StopReason::Failed;
                }
            };
            pages_fetched += 1;

            if fetched.is_empty() {
                break StopReason::Exhausted;
            }
            let last = fetched.is_last();
            let added = buffer.extend(fetched.items);
            debug!(
                "{} page {}: +{} distinct ({} total)",
                self.kind,
                page,
                added,
                buffer.len()
            );
            page = page.saturating_add(1);

            if last && buffer.len() < target_size {
                break StopReason::Exhausted;
            }
        };

        let mut items = buffer.into_items();
        items.truncate(target_size);
        if self.config.order == FeedOrder::Shuffle {
            items.shuffle(&mut rand::rng());
        }

        info!(
            "Accumulated {} {} items from {} pages ({:?})",
            items.len(),
            self.kind,
            pages_fetched,
            stop
        );

        FeedAccumulation {
            items,
            pages_fetched,
            next_page: page,
            stop,
        }
    }
}
