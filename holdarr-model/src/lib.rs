//! Core data model definitions shared across holdarr crates.
#![allow(missing_docs)]

pub mod entry;
pub mod error;
pub mod events;
pub mod ids;
pub mod media;
pub mod naming;
pub mod state;

// Intentionally curated re-exports for downstream consumers.
pub use entry::EntryKey;
pub use error::{ModelError, Result as ModelResult};
pub use events::{
    AddEvent, AddedEpisode, DeleteEvent, ImportEvent, InboundEvent, PlayEvent,
};
pub use ids::{ArrItemId, EpisodeId, RatingKey, SectionId, TmdbId, TvdbId};
pub use media::{DeleteReason, EpisodeNumber, Fidelity, MediaKind, TvScope};
pub use state::LifecycleState;
