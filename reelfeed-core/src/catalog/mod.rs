//! Catalog Client boundary.
//!
//! A thin port over the remote catalog: paginated listings and single-item
//! detail lookups. Implementations do no caching of their own; coalescing
//! and retention live in [`crate::trailer`] and [`crate::feed`].

mod tmdb;

pub use tmdb::TmdbCatalogClient;

use async_trait::async_trait;
use reelfeed_model::{CatalogItem, CatalogPage, ItemId, MediaKind};

use crate::error::Result;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Fetch one page (1-indexed) of the popular listing for `kind`.
    async fn list_popular(&self, kind: MediaKind, page: u32)
    -> Result<CatalogPage>;

    /// Fetch the fully populated item, including its embedded video list.
    async fn get_detail(&self, id: ItemId) -> Result<CatalogItem>;
}
