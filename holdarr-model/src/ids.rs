use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Strongly typed TMDB identifier used for movies.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TmdbId(pub u64);

impl TmdbId {
    pub fn from_string(raw: &str) -> Result<Self, ModelError> {
        raw.trim()
            .parse::<u64>()
            .map(TmdbId)
            .map_err(|_| ModelError::InvalidId(format!("tmdb id: {raw}")))
    }
}

impl std::fmt::Display for TmdbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Strongly typed TVDB identifier used for series.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct TvdbId(pub u64);

impl TvdbId {
    pub fn from_string(raw: &str) -> Result<Self, ModelError> {
        raw.trim()
            .parse::<u64>()
            .map(TvdbId)
            .map_err(|_| ModelError::InvalidId(format!("tvdb id: {raw}")))
    }
}

impl std::fmt::Display for TvdbId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Row id of an item inside an upstream content manager's own database.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ArrItemId(pub i64);

impl std::fmt::Display for ArrItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Upstream episode row id, carried in placeholder file names as `[ID:nnn]`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EpisodeId(pub i64);

impl std::fmt::Display for EpisodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Player-side item identifier (opaque to us).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RatingKey(pub String);

impl RatingKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RatingKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Catalog library section identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct SectionId(pub u32);

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
