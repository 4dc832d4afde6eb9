use std::fmt;

use async_trait::async_trait;
use reelfeed_model::{
    CatalogItem, CatalogPage, ItemId, MediaKind, VideoEntry,
};
use reqwest::{StatusCode, header::ACCEPT};
use serde::{Deserialize, de::DeserializeOwned};
use tracing::{debug, trace};
use url::Url;

use super::CatalogClient;
use crate::{
    config::CatalogConfig,
    error::{CatalogError, Result},
};

/// [`CatalogClient`] backed by the TMDB v3 REST API.
#[derive(Clone)]
pub struct TmdbCatalogClient {
    http: reqwest::Client,
    base_url: Url,
    token: String,
    language: String,
}

impl fmt::Debug for TmdbCatalogClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TmdbCatalogClient")
            .field("base_url", &self.base_url.as_str())
            .field("language", &self.language)
            .field("token", &"<redacted>")
            .finish()
    }
}

impl TmdbCatalogClient {
    /// Build a client from catalog settings and a v4 read-access token.
    pub fn new(config: &CatalogConfig, token: impl Into<String>) -> Result<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            return Err(CatalogError::MissingApiToken);
        }

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let http = builder.build()?;

        Ok(Self {
            http,
            base_url: Url::parse(&config.base_url)?,
            token,
            language: config.language.clone(),
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                CatalogError::InvalidUrl(
                    url::ParseError::RelativeUrlWithCannotBeABaseBase,
                )
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let endpoint = url.path().to_string();
        trace!("GET {}", endpoint);

        let response = self
            .http
            .get(url)
            .bearer_auth(&self.token)
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(CatalogError::NotFound(endpoint));
        }
        if !status.is_success() {
            return Err(CatalogError::Status {
                status: status.as_u16(),
                endpoint,
            });
        }

        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl CatalogClient for TmdbCatalogClient {
    async fn list_popular(
        &self,
        kind: MediaKind,
        page: u32,
    ) -> Result<CatalogPage> {
        let mut url = self.endpoint(&[kind.as_path(), "popular"])?;
        url.query_pairs_mut()
            .append_pair("language", &self.language)
            .append_pair("page", &page.max(1).to_string());

        let wire: WirePage = self.get_json(url).await?;
        let page = wire.into_page(kind);
        debug!(
            "Fetched {} page {}/{} ({} items)",
            kind,
            page.page,
            page.total_pages,
            page.items.len()
        );
        Ok(page)
    }

    async fn get_detail(&self, id: ItemId) -> Result<CatalogItem> {
        let tmdb_id = id.tmdb_id.to_string();
        let mut url = self.endpoint(&[id.kind.as_path(), &tmdb_id])?;
        url.query_pairs_mut()
            .append_pair("language", &self.language)
            .append_pair("append_to_response", "videos");

        let wire: WireDetail = self.get_json(url).await?;
        Ok(wire.into_item(id.kind))
    }
}

#[derive(Debug, Deserialize)]
struct WirePage {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    results: Vec<WireListItem>,
}

impl WirePage {
    fn into_page(self, kind: MediaKind) -> CatalogPage {
        CatalogPage {
            page: self.page,
            total_pages: self.total_pages,
            items: self
                .results
                .into_iter()
                .map(|item| item.into_item(kind))
                .collect(),
        }
    }
}

/// Movies carry `title`/`release_date`, TV carries `name`/`first_air_date`.
#[derive(Debug, Deserialize)]
struct WireListItem {
    id: u64,
    title: Option<String>,
    name: Option<String>,
    poster_path: Option<String>,
    release_date: Option<String>,
    first_air_date: Option<String>,
    overview: Option<String>,
}

impl WireListItem {
    fn into_item(self, kind: MediaKind) -> CatalogItem {
        let non_empty = |s: Option<String>| s.filter(|s| !s.trim().is_empty());
        CatalogItem {
            id: ItemId::new(kind, self.id),
            title: non_empty(self.title)
                .or_else(|| non_empty(self.name))
                .unwrap_or_default(),
            poster_path: non_empty(self.poster_path),
            release_date: non_empty(self.release_date)
                .or_else(|| non_empty(self.first_air_date)),
            overview: non_empty(self.overview),
            videos: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct WireDetail {
    #[serde(flatten)]
    item: WireListItem,
    #[serde(default)]
    videos: Option<WireVideos>,
}

impl WireDetail {
    fn into_item(self, kind: MediaKind) -> CatalogItem {
        let videos = self
            .videos
            .map(|v| v.results)
            .unwrap_or_default()
            .into_iter()
            .map(|v| VideoEntry::new(v.kind, v.site, v.key))
            .collect();
        self.item.into_item(kind).with_videos(videos)
    }
}

#[derive(Debug, Deserialize)]
struct WireVideos {
    #[serde(default)]
    results: Vec<WireVideo>,
}

#[derive(Debug, Deserialize)]
struct WireVideo {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    site: String,
    #[serde(default)]
    key: String,
}
