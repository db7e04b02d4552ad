use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::ids::{ArrItemId, EpisodeId, RatingKey, TmdbId, TvdbId};
use crate::media::{DeleteReason, EpisodeNumber, MediaKind};

/// A playback start reported by the front-end catalog.
///
/// Cross-reference ids may be absent or substituted with template values by
/// the notification agent; the resolver recovers them from `source_path`
/// markers in that case.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayEvent {
    pub kind: MediaKind,
    pub title: String,
    pub tmdb: Option<TmdbId>,
    pub tvdb: Option<TvdbId>,
    pub episode: Option<EpisodeNumber>,
    pub episode_id: Option<EpisodeId>,
    pub rating_key: Option<RatingKey>,
    /// Path of the file the player opened. Only paths identifying a stand-in
    /// are acted upon.
    pub source_path: PathBuf,
}

/// A real file landed in the library, reported by a content manager.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImportEvent {
    pub kind: MediaKind,
    pub title: String,
    pub year: Option<u16>,
    pub tmdb: Option<TmdbId>,
    pub tvdb: Option<TvdbId>,
    pub episode: Option<EpisodeNumber>,
    pub episode_id: Option<EpisodeId>,
    /// Where the manager put the imported file, when the payload carries it.
    pub final_path: Option<PathBuf>,
}

/// A content manager reported a file or entry removed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeleteEvent {
    pub kind: MediaKind,
    pub title: String,
    pub year: Option<u16>,
    pub tmdb: Option<TmdbId>,
    pub tvdb: Option<TvdbId>,
    pub episode: Option<EpisodeNumber>,
    pub episode_id: Option<EpisodeId>,
    pub reason: DeleteReason,
}

/// An entry was newly imported into a content manager; used for pre-seeding
/// stand-ins so the catalog shows the entry immediately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddEvent {
    pub kind: MediaKind,
    pub title: String,
    pub year: Option<u16>,
    pub tmdb: Option<TmdbId>,
    pub tvdb: Option<TvdbId>,
    pub arr_id: Option<ArrItemId>,
    /// For series adds: the episodes to pre-seed.
    pub episodes: Vec<AddedEpisode>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AddedEpisode {
    pub number: EpisodeNumber,
    pub episode_id: Option<EpisodeId>,
}

/// Union of everything the webhook surface can hand to the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InboundEvent {
    Play(PlayEvent),
    Import(ImportEvent),
    Delete(DeleteEvent),
    Add(AddEvent),
}
