//! Feed session: the surface a rendering layer drives.
//!
//! One session wires a catalog client to a shared [`TrailerCache`], a
//! [`VisibilityTracker`], the feed builders and one [`PlaybackController`]
//! per mounted card. Mounting a card hands back a [`CardMount`] guard; its
//! drop unsubscribes the card from visibility and cancels any in-progress
//! playback.

use std::{
    fmt,
    sync::{Arc, Weak},
};

use dashmap::DashMap;
use reelfeed_model::{CatalogItem, ItemId, MediaKind};
use tracing::{debug, trace};

use crate::{
    catalog::CatalogClient,
    config::{CatalogConfig, CoreConfig},
    error::ConfigError,
    feed::{FeedAccumulation, FeedAccumulator, FeedPager, FeedSnapshot, PageOutcome},
    playback::{PlaybackController, PlaybackState},
    trailer::TrailerCache,
    visibility::{ElementId, FocusChange, VisibilitySubscription, VisibilityTracker},
};

type CardRegistry = DashMap<ItemId, PlaybackController>;

pub struct FeedSession {
    kind: MediaKind,
    catalog: CatalogConfig,
    cache: TrailerCache,
    tracker: VisibilityTracker,
    accumulator: FeedAccumulator,
    pager: FeedPager,
    cards: Arc<CardRegistry>,
}

impl fmt::Debug for FeedSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FeedSession")
            .field("kind", &self.kind)
            .field("cache", &self.cache)
            .field("tracker", &self.tracker)
            .field("pager", &self.pager)
            .field("cards", &self.cards.len())
            .finish()
    }
}

impl FeedSession {
    pub fn new(
        client: Arc<dyn CatalogClient>,
        kind: MediaKind,
        config: &CoreConfig,
    ) -> Result<Self, ConfigError> {
        config.validate()?;

        let cache = TrailerCache::new(Arc::clone(&client), config.trailers.clone());
        let tracker = VisibilityTracker::new(config.visibility.clone())?;
        let accumulator =
            FeedAccumulator::new(Arc::clone(&client), kind, config.feed.clone());
        let pager = FeedPager::new(client, kind);

        Ok(Self {
            kind,
            catalog: config.catalog.clone(),
            cache,
            tracker,
            accumulator,
            pager,
            cards: Arc::new(DashMap::new()),
        })
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn trailer_cache(&self) -> &TrailerCache {
        &self.cache
    }

    pub fn tracker(&self) -> &VisibilityTracker {
        &self.tracker
    }

    /// Bounded feed of `target_size` distinct items, continuing from `seed`.
    pub async fn get_feed(
        &self,
        target_size: usize,
        seed: Vec<CatalogItem>,
    ) -> FeedAccumulation {
        self.accumulator.accumulate(target_size, seed).await
    }

    /// Bounded feed using the configured default size.
    pub async fn get_default_feed(&self) -> FeedAccumulation {
        self.get_feed(self.accumulator.config().target_size, Vec::new())
            .await
    }

    /// Append the next page of the scrolling feed.
    pub async fn get_next_page(&self) -> (PageOutcome, FeedSnapshot) {
        let outcome = self.pager.next_page().await;
        (outcome, self.pager.snapshot())
    }

    pub fn feed_snapshot(&self) -> FeedSnapshot {
        self.pager.snapshot()
    }

    pub fn reset_feed(&self) {
        self.pager.reset();
    }

    /// Poster URL for `item` at the configured size, if it has artwork.
    pub fn poster_url(&self, item: &CatalogItem) -> Option<String> {
        item.poster_url(&self.catalog.image_base_url, self.catalog.poster_size)
    }

    /// Observe an arbitrary element. Card playback is wired through
    /// [`FeedSession::mount_card`] instead.
    pub fn subscribe_visibility<F>(
        &self,
        element: ElementId,
        on_focus_change: F,
    ) -> VisibilitySubscription
    where
        F: Fn(FocusChange) + Send + Sync + 'static,
    {
        self.tracker.subscribe(element, on_focus_change)
    }

    pub fn report_intersection(
        &self,
        element: ElementId,
        ratio: f32,
        is_intersecting: bool,
    ) -> Option<FocusChange> {
        self.tracker.report(element, ratio, is_intersecting)
    }

    /// Mount a card for `item` rendered as `element`. Focus edges for the
    /// element drive the card's controller until the guard is dropped.
    /// Mounting an item that is already mounted replaces the old card.
    pub fn mount_card(&self, element: ElementId, item: ItemId) -> CardMount {
        let controller = PlaybackController::new(item, self.cache.clone());

        let on_focus = controller.clone();
        let subscription = self.tracker.subscribe(element, move |change| {
            on_focus.on_focus_changed(change.focused);
        });

        if let Some(previous) = self.cards.insert(item, controller.clone()) {
            debug!("{} remounted, stopping previous card", item);
            previous.stop_playback();
        }
        trace!("card mounted: {} as {}", item, element);

        CardMount {
            item,
            element,
            controller,
            cards: Arc::downgrade(&self.cards),
            subscription: Some(subscription),
        }
    }

    pub fn controller(&self, item: ItemId) -> Option<PlaybackController> {
        self.cards.get(&item).map(|c| c.clone())
    }

    pub fn mounted_cards(&self) -> usize {
        self.cards.len()
    }

    /// `None` when no card is mounted for `item`.
    pub fn playback_state(&self, item: ItemId) -> Option<PlaybackState> {
        self.cards.get(&item).map(|c| c.state())
    }

    pub async fn request_playback(&self, item: ItemId) -> Option<PlaybackState> {
        let controller = self.controller(item)?;
        Some(controller.request_playback().await)
    }

    pub fn stop_playback(&self, item: ItemId) -> Option<PlaybackState> {
        self.cards.get(&item).map(|c| c.stop_playback())
    }

    pub async fn toggle_playback(&self, item: ItemId) -> Option<PlaybackState> {
        let controller = self.controller(item)?;
        Some(controller.toggle().await)
    }
}

/// A mounted card. Dropping it unmounts the card.
#[must_use = "dropping the mount unmounts the card immediately"]
pub struct CardMount {
    item: ItemId,
    element: ElementId,
    controller: PlaybackController,
    cards: Weak<CardRegistry>,
    subscription: Option<VisibilitySubscription>,
}

impl fmt::Debug for CardMount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CardMount")
            .field("item", &self.item)
            .field("element", &self.element)
            .field("controller", &self.controller)
            .finish()
    }
}

impl CardMount {
    pub fn item(&self) -> ItemId {
        self.item
    }

    pub fn element(&self) -> ElementId {
        self.element
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn unmount(self) {}
}

impl Drop for CardMount {
    fn drop(&mut self) {
        if let Some(subscription) = self.subscription.take() {
            subscription.unsubscribe();
        }
        self.controller.stop_playback();
        if let Some(cards) = self.cards.upgrade() {
            cards.remove_if(&self.item, |_, c| c.ptr_eq(&self.controller));
        }
        trace!("card unmounted: {} as {}", self.item, self.element);
    }
}
