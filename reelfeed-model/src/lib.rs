//! Core data model definitions shared across reelfeed crates.
#![allow(missing_docs)]

pub mod error;
pub mod ids;
pub mod image;
pub mod item;
pub mod media_kind;
pub mod video;

// Intentionally curated re-exports for downstream consumers.
pub use error::{ModelError, Result as ModelResult};
pub use ids::ItemId;
pub use image::{DEFAULT_IMAGE_BASE, PosterSize};
pub use item::{CatalogItem, CatalogPage};
pub use media_kind::MediaKind;
pub use video::{
    DEFAULT_VIDEO_HOST, TrailerRef, VideoEntry, VideoKind, select_trailer,
};
