use std::{fmt, str::FromStr};

use crate::{error::ModelError, media_kind::MediaKind};

/// Strongly typed catalog identifier.
///
/// The numeric id is source-assigned and only unique within its
/// [`MediaKind`], so both halves participate in equality and hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ItemId {
    pub kind: MediaKind,
    pub tmdb_id: u64,
}

impl ItemId {
    pub const fn new(kind: MediaKind, tmdb_id: u64) -> Self {
        Self { kind, tmdb_id }
    }

    pub const fn movie(tmdb_id: u64) -> Self {
        Self::new(MediaKind::Movie, tmdb_id)
    }

    pub const fn tv(tmdb_id: u64) -> Self {
        Self::new(MediaKind::Tv, tmdb_id)
    }

    pub fn kind(&self) -> MediaKind {
        self.kind
    }

    pub fn tmdb_id(&self) -> u64 {
        self.tmdb_id
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.tmdb_id)
    }
}

/// Accepts `550`, `movie/550`, `tv/1399` and `tv:1399`. A bare number is
/// treated as a movie.
impl FromStr for ItemId {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let (kind, id) = match raw.split_once(['/', ':']) {
            Some((kind, id)) => (kind.parse::<MediaKind>()?, id),
            None => (MediaKind::Movie, raw),
        };
        let tmdb_id = id
            .trim()
            .parse::<u64>()
            .map_err(|_| ModelError::InvalidItemId(raw.to_string()))?;
        Ok(Self::new(kind, tmdb_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_and_qualified_ids() {
        assert_eq!("550".parse::<ItemId>().unwrap(), ItemId::movie(550));
        assert_eq!("tv/1399".parse::<ItemId>().unwrap(), ItemId::tv(1399));
        assert_eq!("movie:27205".parse::<ItemId>().unwrap(), ItemId::movie(27205));
        assert!("tv/abc".parse::<ItemId>().is_err());
        assert!("film/1".parse::<ItemId>().is_err());
    }

    #[test]
    fn kind_is_part_of_identity() {
        assert_ne!(ItemId::movie(1), ItemId::tv(1));
        assert_eq!(ItemId::tv(7).to_string(), "tv/7");
    }
}
