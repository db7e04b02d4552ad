use crate::error::ModelError;
use serde::{Deserialize, Serialize};

/// Kind of media an entry represents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum MediaKind {
    Movie,
    Tv,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Movie => "movie",
            MediaKind::Tv => "tv",
        }
    }
}

impl std::fmt::Display for MediaKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which acquisition pipeline an entry belongs to. High fidelity maps to the
/// dedicated 4K manager instances and library roots when configured.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum Fidelity {
    #[default]
    Standard,
    High,
}

impl Fidelity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fidelity::Standard => "standard",
            Fidelity::High => "high",
        }
    }
}

impl std::fmt::Display for Fidelity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granularity at which television acquisitions are triggered and deduplicated.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TvScope {
    #[default]
    Episode,
    Season,
    Series,
}

impl TvScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            TvScope::Episode => "episode",
            TvScope::Season => "season",
            TvScope::Series => "series",
        }
    }
}

impl std::str::FromStr for TvScope {
    type Err = ModelError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "episode" => Ok(TvScope::Episode),
            "season" => Ok(TvScope::Season),
            "series" => Ok(TvScope::Series),
            other => Err(ModelError::InvalidOption(format!(
                "tv scope must be episode, season or series, got {other}"
            ))),
        }
    }
}

impl std::fmt::Display for TvScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Season/episode coordinates of a single television unit.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct EpisodeNumber {
    pub season: u16,
    pub episode: u16,
}

impl EpisodeNumber {
    pub fn new(season: u16, episode: u16) -> Self {
        Self { season, episode }
    }

    pub fn is_special(&self) -> bool {
        self.season == 0
    }
}

impl std::fmt::Display for EpisodeNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "s{:02}e{:02}", self.season, self.episode)
    }
}

/// Why an upstream delete event fired.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum DeleteReason {
    /// The backing file was removed (or replaced by an upgrade); the entry
    /// itself survives and reverts to a stand-in.
    FileRemoved,
    /// The entry was removed from the content manager outright.
    EntryRemoved,
}
