use std::fmt::{self, Display, Formatter};

/// Public image CDN root for catalog artwork.
pub const DEFAULT_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";

/// Poster width variants understood by the image CDN.
#[derive(Debug, Clone, Copy, PartialEq, Hash, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PosterSize {
    W92,
    W154,
    W185,
    W342,
    W500,
    W780,
    /// Full-bleed feed cards.
    #[default]
    W1280,
    Original,
}

impl PosterSize {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PosterSize::W92 => "w92",
            PosterSize::W154 => "w154",
            PosterSize::W185 => "w185",
            PosterSize::W342 => "w342",
            PosterSize::W500 => "w500",
            PosterSize::W780 => "w780",
            PosterSize::W1280 => "w1280",
            PosterSize::Original => "original",
        }
    }

    /// Get the width hint for this size
    pub const fn width(&self) -> Option<u16> {
        match self {
            PosterSize::W92 => Some(92),
            PosterSize::W154 => Some(154),
            PosterSize::W185 => Some(185),
            PosterSize::W342 => Some(342),
            PosterSize::W500 => Some(500),
            PosterSize::W780 => Some(780),
            PosterSize::W1280 => Some(1280),
            PosterSize::Original => None,
        }
    }
}

impl Display for PosterSize {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Join an image base, a size segment and a catalog-relative path
/// (`/abc.jpg`). Tolerates a trailing slash on the base and a missing
/// leading slash on the path.
pub fn image_url(base: &str, size: PosterSize, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{base}/{}/{path}", size.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn image_url_normalizes_slashes() {
        assert_eq!(
            image_url(DEFAULT_IMAGE_BASE, PosterSize::W1280, "/p.jpg"),
            "https://image.tmdb.org/t/p/w1280/p.jpg"
        );
        assert_eq!(
            image_url("http://cdn/", PosterSize::W92, "q.jpg"),
            "http://cdn/w92/q.jpg"
        );
    }
}
