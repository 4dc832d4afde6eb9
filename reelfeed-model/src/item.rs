use crate::{
    ids::ItemId,
    image::{PosterSize, image_url},
    video::VideoEntry,
};

/// One catalog entry.
///
/// List endpoints return a partial item (`videos` is `None`); the detail
/// endpoint fills the embedded video list. Items are never mutated after
/// they are fetched.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogItem {
    pub id: ItemId,
    pub title: String,
    pub poster_path: Option<String>,
    /// Raw `YYYY-MM-DD` string as served by the catalog.
    pub release_date: Option<String>,
    pub overview: Option<String>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub videos: Option<Vec<VideoEntry>>,
}

impl CatalogItem {
    /// Minimal list-view item.
    pub fn new(id: ItemId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            poster_path: None,
            release_date: None,
            overview: None,
            videos: None,
        }
    }

    pub fn with_poster(mut self, path: impl Into<String>) -> Self {
        self.poster_path = Some(path.into());
        self
    }

    pub fn with_release_date(mut self, date: impl Into<String>) -> Self {
        self.release_date = Some(date.into());
        self
    }

    pub fn with_overview(mut self, overview: impl Into<String>) -> Self {
        self.overview = Some(overview.into());
        self
    }

    pub fn with_videos(mut self, videos: Vec<VideoEntry>) -> Self {
        self.videos = Some(videos);
        self
    }

    /// Whether this item came from a detail lookup.
    pub fn is_detailed(&self) -> bool {
        self.videos.is_some()
    }

    pub fn videos(&self) -> &[VideoEntry] {
        self.videos.as_deref().unwrap_or_default()
    }

    pub fn poster_url(&self, image_base: &str, size: PosterSize) -> Option<String> {
        self.poster_path
            .as_deref()
            .filter(|p| !p.is_empty())
            .map(|p| image_url(image_base, size, p))
    }

    /// Leading year of the release date, if it has one.
    pub fn release_year(&self) -> Option<u16> {
        let date = self.release_date.as_deref()?;
        date.split('-').next()?.trim().parse().ok()
    }

    #[cfg(feature = "chrono")]
    pub fn release_date_parsed(&self) -> Option<chrono::NaiveDate> {
        let date = self.release_date.as_deref()?;
        chrono::NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").ok()
    }
}

/// One page of a paginated listing. Pages are 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CatalogPage {
    pub page: u32,
    pub total_pages: u32,
    pub items: Vec<CatalogItem>,
}

impl CatalogPage {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// True when the source says there is nothing after this page.
    pub fn is_last(&self) -> bool {
        self.total_pages != 0 && self.page >= self.total_pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_year_tolerates_partial_dates() {
        let item = CatalogItem::new(ItemId::movie(1), "A")
            .with_release_date("1999-10-15");
        assert_eq!(item.release_year(), Some(1999));

        let blank = CatalogItem::new(ItemId::movie(2), "B").with_release_date("");
        assert_eq!(blank.release_year(), None);
    }

    #[test]
    fn empty_poster_path_has_no_url() {
        let item = CatalogItem::new(ItemId::movie(1), "A").with_poster("");
        assert!(item.poster_url("http://cdn", PosterSize::W92).is_none());
    }

    #[test]
    fn last_page_detection_ignores_unknown_totals() {
        let page = CatalogPage { page: 3, total_pages: 0, items: vec![] };
        assert!(!page.is_last());
        let page = CatalogPage { page: 3, total_pages: 3, items: vec![] };
        assert!(page.is_last());
    }
}
