//! Trailer Resolution Cache.
//!
//! Maps an item to its playable trailer (or the confirmed absence of one)
//! and coalesces concurrent lookups for the same item into a single detail
//! request. The cache is an owned service: create one per application and
//! hand out clones, which share state.
//!
//! Entry lifecycle per item:
//!
//! ```text
//! (none) --resolve--> Pending --found/absent--> Resolved (terminal)
//!                        \------failure-------> (none)   retried by next caller
//! ```
//!
//! Each Pending entry carries the generation of the request that created
//! it. A request only writes back over its own generation, so one that
//! outlived a `clear()` cannot disturb the request that replaced it.
//!
//! The underlying request runs on its own task, so a caller that gives up
//! waiting never stops the fetch other callers are attached to.

use std::{
    fmt,
    sync::{
        Arc, Weak,
        atomic::{AtomicU64, Ordering},
    },
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::{
    FutureExt,
    future::{BoxFuture, Shared},
};
use reelfeed_model::{ItemId, TrailerRef, select_trailer};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::{catalog::CatalogClient, config::TrailerCacheConfig};

/// What one caller observed from [`TrailerCache::resolve_outcome`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// A playable trailer exists.
    Found(TrailerRef),
    /// The item has no qualifying trailer. Cached.
    Absent,
    /// The lookup failed. Not cached; the next caller retries.
    Unavailable,
    /// This caller stopped waiting. Shared work is unaffected.
    Cancelled,
}

impl Resolution {
    pub fn trailer(&self) -> Option<&TrailerRef> {
        match self {
            Resolution::Found(trailer) => Some(trailer),
            _ => None,
        }
    }

    pub fn into_trailer(self) -> Option<TrailerRef> {
        match self {
            Resolution::Found(trailer) => Some(trailer),
            _ => None,
        }
    }
}

/// Point-in-time counters for diagnostics and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Calls answered from a resolved entry without any request.
    pub hits: u64,
    /// Calls that started an underlying request.
    pub leaders: u64,
    /// Calls that attached to an in-flight request.
    pub joiners: u64,
    /// Underlying requests that failed.
    pub failures: u64,
    /// Calls that stopped waiting because their token fired.
    pub cancelled: u64,
}

#[derive(Debug, Clone)]
enum Settled {
    Found(TrailerRef),
    Absent,
    Failed,
}

type PendingResolution = Shared<BoxFuture<'static, Settled>>;

enum CacheEntry {
    Pending {
        generation: u64,
        resolution: PendingResolution,
    },
    Resolved {
        trailer: Option<TrailerRef>,
        at: Instant,
    },
}

#[derive(Default)]
struct Counters {
    hits: AtomicU64,
    leaders: AtomicU64,
    joiners: AtomicU64,
    failures: AtomicU64,
    cancelled: AtomicU64,
}

struct CacheInner {
    client: Arc<dyn CatalogClient>,
    config: TrailerCacheConfig,
    entries: DashMap<ItemId, CacheEntry>,
    counters: Counters,
    generations: AtomicU64,
}

impl CacheEntry {
    fn is_pending(&self) -> bool {
        matches!(self, CacheEntry::Pending { .. })
    }

    fn is_pending_for(&self, generation: u64) -> bool {
        matches!(
            self,
            CacheEntry::Pending { generation: g, .. } if *g == generation
        )
    }
}

impl CacheInner {
    fn is_expired(&self, trailer: &Option<TrailerRef>, at: Instant) -> bool {
        trailer.is_none()
            && self
                .config
                .absent_ttl()
                .is_some_and(|ttl| at.elapsed() >= ttl)
    }

    /// Replace the entry this request registered with the settled value.
    /// If a `clear()` dropped it, or a newer request took the key, nothing
    /// is written back.
    fn settle(&self, id: ItemId, generation: u64, settled: &Settled) {
        let resolved = match settled {
            Settled::Found(trailer) => Some(Some(trailer.clone())),
            Settled::Absent => Some(None),
            Settled::Failed => None,
        };

        match resolved {
            Some(trailer) => {
                if let Some(mut entry) = self.entries.get_mut(&id)
                    && entry.is_pending_for(generation)
                {
                    *entry = CacheEntry::Resolved {
                        trailer,
                        at: Instant::now(),
                    };
                }
            }
            None => {
                self.entries
                    .remove_if(&id, |_, e| e.is_pending_for(generation));
            }
        }
    }
}

/// Process-wide, cloneable trailer cache.
#[derive(Clone)]
pub struct TrailerCache {
    inner: Arc<CacheInner>,
}

impl fmt::Debug for TrailerCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let pending = self
            .inner
            .entries
            .iter()
            .filter(|e| e.value().is_pending())
            .count();

        f.debug_struct("TrailerCache")
            .field("entries", &self.inner.entries.len())
            .field("pending", &pending)
            .field("config", &self.inner.config)
            .field("stats", &self.stats())
            .finish()
    }
}

impl TrailerCache {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        config: TrailerCacheConfig,
    ) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                client,
                config,
                entries: DashMap::new(),
                counters: Counters::default(),
                generations: AtomicU64::new(0),
            }),
        }
    }

    /// Resolve the trailer for `id`, or `None` when there is none, the
    /// lookup failed, or `cancel` fired first.
    pub async fn resolve(
        &self,
        id: ItemId,
        cancel: &CancellationToken,
    ) -> Option<TrailerRef> {
        self.resolve_outcome(id, cancel).await.into_trailer()
    }

    /// Like [`resolve`](Self::resolve) but reports why nothing came back.
    pub async fn resolve_outcome(
        &self,
        id: ItemId,
        cancel: &CancellationToken,
    ) -> Resolution {
        let counters = &self.inner.counters;

        if cancel.is_cancelled() {
            counters.cancelled.fetch_add(1, Ordering::Relaxed);
            return Resolution::Cancelled;
        }

        let pending = match self.inner.entries.entry(id) {
            Entry::Occupied(mut occupied) => match occupied.get() {
                CacheEntry::Resolved { trailer, at }
                    if !self.inner.is_expired(trailer, *at) =>
                {
                    counters.hits.fetch_add(1, Ordering::Relaxed);
                    trace!("trailer cache hit: {}", id);
                    return match trailer {
                        Some(trailer) => Resolution::Found(trailer.clone()),
                        None => Resolution::Absent,
                    };
                }
                CacheEntry::Resolved { .. } => {
                    debug!("trailer absence expired, re-resolving: {}", id);
                    let (generation, pending) = self.launch(id);
                    occupied.insert(CacheEntry::Pending {
                        generation,
                        resolution: pending.clone(),
                    });
                    pending
                }
                CacheEntry::Pending { resolution, .. } => {
                    let joiners =
                        counters.joiners.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(
                        "trailer singleflight wait: item={}, joiners={}",
                        id, joiners
                    );
                    resolution.clone()
                }
            },
            Entry::Vacant(vacant) => {
                let (generation, pending) = self.launch(id);
                vacant.insert(CacheEntry::Pending {
                    generation,
                    resolution: pending.clone(),
                });
                pending
            }
        };

        let settled = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            settled = pending => Some(settled),
        };

        // Checked again after resuming: a token that fired while the
        // request settled still means this caller has gone away.
        let Some(settled) = settled.filter(|_| !cancel.is_cancelled()) else {
            counters.cancelled.fetch_add(1, Ordering::Relaxed);
            return Resolution::Cancelled;
        };

        match settled {
            Settled::Found(trailer) => Resolution::Found(trailer),
            Settled::Absent => Resolution::Absent,
            Settled::Failed => Resolution::Unavailable,
        }
    }

    /// Start the single underlying request for `id` and return the
    /// generation it settles under. Called with the entry's shard locked,
    /// so the request is registered before anyone else can observe the key.
    fn launch(&self, id: ItemId) -> (u64, PendingResolution) {
        let generation =
            self.inner.generations.fetch_add(1, Ordering::Relaxed);
        let leaders =
            self.inner.counters.leaders.fetch_add(1, Ordering::Relaxed) + 1;
        debug!(
            "trailer singleflight lead: item={}, leaders={}",
            id, leaders
        );

        let inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(async move {
            let host = inner.config.video_host.as_str();
            let settled = match inner.client.get_detail(id).await {
                Ok(item) => match select_trailer(id, item.videos(), host) {
                    Some(trailer) => Settled::Found(trailer),
                    None => Settled::Absent,
                },
                Err(err) => {
                    inner.counters.failures.fetch_add(1, Ordering::Relaxed);
                    warn!(
                        transient = err.is_transient(),
                        "trailer lookup for {} failed: {}", id, err
                    );
                    Settled::Failed
                }
            };
            inner.settle(id, generation, &settled);
            debug!("trailer singleflight complete: item={}", id);
            settled
        });

        let weak: Weak<CacheInner> = Arc::downgrade(&self.inner);
        let resolution = handle
            .map(move |joined| {
                joined.unwrap_or_else(|err| {
                    warn!("trailer lookup task for {} aborted: {}", id, err);
                    if let Some(inner) = weak.upgrade() {
                        inner
                            .counters
                            .failures
                            .fetch_add(1, Ordering::Relaxed);
                        inner.settle(id, generation, &Settled::Failed);
                    }
                    Settled::Failed
                })
            })
            .boxed()
            .shared();
        (generation, resolution)
    }

    /// The resolved value for `id` without starting a request: `Some(Some)`
    /// for a trailer, `Some(None)` for confirmed absence, `None` when
    /// nothing usable is cached.
    pub fn peek(&self, id: ItemId) -> Option<Option<TrailerRef>> {
        match self.inner.entries.get(&id)?.value() {
            CacheEntry::Resolved { trailer, at }
                if !self.inner.is_expired(trailer, *at) =>
            {
                Some(trailer.clone())
            }
            _ => None,
        }
    }

    pub fn is_pending(&self, id: ItemId) -> bool {
        self.inner
            .entries
            .get(&id)
            .is_some_and(|e| e.value().is_pending())
    }

    pub fn len(&self) -> usize {
        self.inner.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.entries.is_empty()
    }

    /// Drop every entry. In-flight requests still complete and still
    /// answer their attached callers, but do not repopulate the cache.
    pub fn clear(&self) {
        self.inner.entries.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let c = &self.inner.counters;
        CacheStats {
            hits: c.hits.load(Ordering::Relaxed),
            leaders: c.leaders.load(Ordering::Relaxed),
            joiners: c.joiners.load(Ordering::Relaxed),
            failures: c.failures.load(Ordering::Relaxed),
            cancelled: c.cancelled.load(Ordering::Relaxed),
        }
    }
}
