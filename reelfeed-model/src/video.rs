use std::fmt;

use crate::ids::ItemId;

/// Host whose videos can be embedded by the player surface.
pub const DEFAULT_VIDEO_HOST: &str = "YouTube";

const EMBED_BASE: &str = "https://www.youtube.com/embed";
const EMBED_PARAMS: &str =
    "autoplay=1&mute=0&controls=1&rel=0&modestbranding=1&playsinline=1";

/// Video classification as reported by the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "String", into = "String"))]
pub enum VideoKind {
    Trailer,
    Teaser,
    Other(String),
}

impl From<&str> for VideoKind {
    fn from(raw: &str) -> Self {
        match raw {
            "Trailer" => VideoKind::Trailer,
            "Teaser" => VideoKind::Teaser,
            other => VideoKind::Other(other.to_string()),
        }
    }
}

impl From<String> for VideoKind {
    fn from(raw: String) -> Self {
        VideoKind::from(raw.as_str())
    }
}

impl From<VideoKind> for String {
    fn from(kind: VideoKind) -> Self {
        kind.to_string()
    }
}

impl fmt::Display for VideoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VideoKind::Trailer => f.write_str("Trailer"),
            VideoKind::Teaser => f.write_str("Teaser"),
            VideoKind::Other(other) => f.write_str(other),
        }
    }
}

/// One entry of an item's embedded video list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VideoEntry {
    pub kind: VideoKind,
    pub host_site: String,
    pub key: String,
}

impl VideoEntry {
    pub fn new(
        kind: impl Into<VideoKind>,
        host_site: impl Into<String>,
        key: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            host_site: host_site.into(),
            key: key.into(),
        }
    }
}

/// A resolved, playable trailer for exactly one catalog item.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrailerRef {
    pub item: ItemId,
    pub key: String,
    pub kind: VideoKind,
}

impl TrailerRef {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Autoplaying embed URL for the player surface.
    pub fn embed_url(&self) -> String {
        format!("{EMBED_BASE}/{}?{EMBED_PARAMS}", self.key)
    }
}

/// Pick the trailer to play for `item` from its video list.
///
/// Only entries on `host` with a non-empty key qualify. The first
/// `Trailer` wins; otherwise the first `Teaser`; otherwise nothing.
pub fn select_trailer(
    item: ItemId,
    videos: &[VideoEntry],
    host: &str,
) -> Option<TrailerRef> {
    let on_host = |v: &&VideoEntry| v.host_site == host && !v.key.is_empty();
    let pick = |kind: VideoKind| {
        videos.iter().filter(on_host).find(|v| v.kind == kind)
    };

    pick(VideoKind::Trailer)
        .or_else(|| pick(VideoKind::Teaser))
        .map(|v| TrailerRef {
            item,
            key: v.key.clone(),
            kind: v.kind.clone(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id() -> ItemId {
        ItemId::movie(550)
    }

    #[test]
    fn trailer_beats_earlier_teaser() {
        let videos = vec![
            VideoEntry::new("Teaser", "YouTube", "teaser1"),
            VideoEntry::new("Featurette", "YouTube", "feat"),
            VideoEntry::new("Trailer", "YouTube", "trailer1"),
            VideoEntry::new("Trailer", "YouTube", "trailer2"),
        ];
        let picked = select_trailer(id(), &videos, DEFAULT_VIDEO_HOST).unwrap();
        assert_eq!(picked.key, "trailer1");
        assert_eq!(picked.kind, VideoKind::Trailer);
    }

    #[test]
    fn falls_back_to_teaser_and_ignores_other_hosts() {
        let videos = vec![
            VideoEntry::new("Trailer", "Vimeo", "vimeo"),
            VideoEntry::new("Teaser", "YouTube", "teaser"),
        ];
        let picked = select_trailer(id(), &videos, DEFAULT_VIDEO_HOST).unwrap();
        assert_eq!(picked.key, "teaser");
    }

    #[test]
    fn nothing_playable_is_absent() {
        let videos = vec![
            VideoEntry::new("Clip", "YouTube", "clip"),
            VideoEntry::new("Trailer", "YouTube", ""),
        ];
        assert!(select_trailer(id(), &videos, DEFAULT_VIDEO_HOST).is_none());
        assert!(select_trailer(id(), &[], DEFAULT_VIDEO_HOST).is_none());
    }

    #[test]
    fn embed_url_autoplays() {
        let trailer = TrailerRef {
            item: id(),
            key: "abc".into(),
            kind: VideoKind::Trailer,
        };
        assert_eq!(
            trailer.embed_url(),
            "https://www.youtube.com/embed/abc?autoplay=1&mute=0&controls=1&rel=0&modestbranding=1&playsinline=1"
        );
    }
}
