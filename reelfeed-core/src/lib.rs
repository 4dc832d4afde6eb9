//! Core of the reelfeed browsing client.
//!
//! Turns a paginated remote catalog into a scrolling feed of posters that
//! swap to autoplaying trailers when they take focus:
//!
//! - [`catalog`]: the port to the remote catalog and its TMDB adapter.
//! - [`trailer`]: process-wide trailer cache with in-flight coalescing.
//! - [`visibility`]: per-element focus tracking from intersection samples.
//! - [`playback`]: per-card poster/trailer state machine.
//! - [`feed`]: bounded accumulation and incremental paging.
//! - [`session`]: the facade a rendering layer drives.
#![allow(missing_docs)]

pub mod catalog;
pub mod config;
pub mod error;
pub mod feed;
pub mod playback;
pub mod session;
pub mod trailer;
pub mod visibility;

pub use catalog::{CatalogClient, TmdbCatalogClient};
pub use config::{
    CatalogConfig, CoreConfig, FeedConfig, FeedOrder, TrailerCacheConfig,
    VisibilityConfig,
};
pub use error::{CatalogError, ConfigError, Result};
pub use feed::{
    FeedAccumulation, FeedAccumulator, FeedBuffer, FeedPager, FeedSnapshot,
    PageOutcome, StopReason,
};
pub use playback::{PlaybackController, PlaybackState};
pub use session::{CardMount, FeedSession};
pub use trailer::{CacheStats, Resolution, TrailerCache};
pub use visibility::{
    ElementId, FocusCallback, FocusChange, VisibilitySubscription,
    VisibilityTracker,
};

pub use reelfeed_model as model;
