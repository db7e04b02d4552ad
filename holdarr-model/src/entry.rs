use serde::{Deserialize, Serialize};

use crate::ids::{TmdbId, TvdbId};
use crate::media::{EpisodeNumber, Fidelity, TvScope};

/// Canonical identity of one lifecycle record.
///
/// Movies key on their TMDB id; television keys on the TVDB id at the
/// *configured* scope granularity, so that play events on sibling units
/// collapse onto one identity (and therefore one dedup token). Exactly one
/// lifecycle record exists per key at any time.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize,
)]
pub enum EntryKey {
    Movie {
        tmdb: TmdbId,
        fidelity: Fidelity,
    },
    Episode {
        tvdb: TvdbId,
        fidelity: Fidelity,
        number: EpisodeNumber,
    },
    Season {
        tvdb: TvdbId,
        fidelity: Fidelity,
        season: u16,
    },
    Series {
        tvdb: TvdbId,
        fidelity: Fidelity,
    },
}

impl EntryKey {
    pub fn movie(tmdb: TmdbId, fidelity: Fidelity) -> Self {
        EntryKey::Movie { tmdb, fidelity }
    }

    /// Key a television unit at the given scope granularity.
    pub fn tv_scoped(
        tvdb: TvdbId,
        fidelity: Fidelity,
        scope: TvScope,
        number: EpisodeNumber,
    ) -> Self {
        match scope {
            TvScope::Episode => EntryKey::Episode {
                tvdb,
                fidelity,
                number,
            },
            TvScope::Season => EntryKey::Season {
                tvdb,
                fidelity,
                season: number.season,
            },
            TvScope::Series => EntryKey::Series { tvdb, fidelity },
        }
    }

    pub fn kind(&self) -> crate::media::MediaKind {
        match self {
            EntryKey::Movie { .. } => crate::media::MediaKind::Movie,
            _ => crate::media::MediaKind::Tv,
        }
    }

    pub fn fidelity(&self) -> Fidelity {
        match self {
            EntryKey::Movie { fidelity, .. }
            | EntryKey::Episode { fidelity, .. }
            | EntryKey::Season { fidelity, .. }
            | EntryKey::Series { fidelity, .. } => *fidelity,
        }
    }

    pub fn is_movie(&self) -> bool {
        matches!(self, EntryKey::Movie { .. })
    }
}

impl std::fmt::Display for EntryKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryKey::Movie { tmdb, fidelity } => {
                write!(f, "movie:{tmdb}@{fidelity}")
            }
            EntryKey::Episode {
                tvdb,
                fidelity,
                number,
            } => write!(f, "tv:{tvdb}/{number}@{fidelity}"),
            EntryKey::Season {
                tvdb,
                fidelity,
                season,
            } => write!(f, "tv:{tvdb}/s{season:02}@{fidelity}"),
            EntryKey::Series { tvdb, fidelity } => {
                write!(f, "tv:{tvdb}@{fidelity}")
            }
        }
    }
}
