use std::time::Duration;

use reelfeed_model::{DEFAULT_IMAGE_BASE, DEFAULT_VIDEO_HOST, PosterSize};
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Knobs for the whole core. Every field carries a default so a partial
/// configuration file only has to name what it changes.
#[derive(Clone, Debug, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct CoreConfig {
    pub catalog: CatalogConfig,
    pub feed: FeedConfig,
    pub visibility: VisibilityConfig,
    pub trailers: TrailerCacheConfig,
}

impl CoreConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.feed.validate()?;
        self.visibility.validate()
    }
}

/// Remote catalog endpoint settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CatalogConfig {
    pub base_url: String,
    pub image_base_url: String,
    pub language: String,
    /// Per-request timeout in seconds. `0` disables the timeout.
    pub request_timeout_secs: u64,
    pub poster_size: PosterSize,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.themoviedb.org/3".to_string(),
            image_base_url: DEFAULT_IMAGE_BASE.to_string(),
            language: "en-US".to_string(),
            request_timeout_secs: 30,
            poster_size: PosterSize::default(),
        }
    }
}

impl CatalogConfig {
    pub fn request_timeout(&self) -> Option<Duration> {
        (self.request_timeout_secs > 0)
            .then(|| Duration::from_secs(self.request_timeout_secs))
    }
}

/// How an accumulated feed is ordered before it is handed out.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum FeedOrder {
    /// Source order (page order, then position within the page).
    Preserve,
    /// Fresh uniform permutation on every call.
    #[default]
    Shuffle,
}

/// Paginated accumulation settings.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FeedConfig {
    /// Items a full feed aims for when the caller does not say.
    pub target_size: usize,
    /// Hard cap on pages requested by one accumulation run.
    pub max_pages: u32,
    pub order: FeedOrder,
    /// Typical number of items per source page. Only used to pick the
    /// first page to request when continuing from seed items.
    pub items_per_page_hint: usize,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            target_size: 40,
            max_pages: 20,
            order: FeedOrder::default(),
            items_per_page_hint: 20,
        }
    }
}

impl FeedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_pages == 0 {
            return Err(ConfigError::ZeroPageCeiling);
        }
        if self.target_size == 0 {
            return Err(ConfigError::ZeroTargetSize);
        }
        Ok(())
    }
}

/// Card visibility thresholds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct VisibilityConfig {
    /// Intersection ratio at or above which a card counts as focused.
    pub focus_threshold: f32,
    /// Extra ratios reported as bands for finer-grained consumers.
    pub report_thresholds: Vec<f32>,
}

impl Default for VisibilityConfig {
    fn default() -> Self {
        Self {
            focus_threshold: 0.55,
            report_thresholds: vec![0.0, 0.55, 0.8],
        }
    }
}

impl VisibilityConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        std::iter::once(&self.focus_threshold)
            .chain(self.report_thresholds.iter())
            .find(|t| !(0.0..=1.0).contains(*t))
            .map_or(Ok(()), |t| Err(ConfigError::InvalidThreshold(*t)))
    }
}

/// Trailer resolution cache policy.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrailerCacheConfig {
    /// Video host whose entries are playable.
    pub video_host: String,
    /// How long a confirmed "no trailer" answer is trusted, in seconds.
    /// `None` keeps it for the lifetime of the cache.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub absent_ttl_secs: Option<u64>,
}

impl Default for TrailerCacheConfig {
    fn default() -> Self {
        Self {
            video_host: DEFAULT_VIDEO_HOST.to_string(),
            absent_ttl_secs: None,
        }
    }
}

impl TrailerCacheConfig {
    pub fn absent_ttl(&self) -> Option<Duration> {
        self.absent_ttl_secs.map(Duration::from_secs)
    }
}
