//! Acquisition client adapters for the upstream content managers.
//!
//! One adapter instance exists per (media kind, fidelity) pair; the
//! [`AdapterSet`] picks the right one for an entry. All upstream calls are
//! issued with the configured bounded timeout so a stalled manager cannot
//! stall the orchestrator.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use holdarr_config::Config;
use holdarr_model::{
    EpisodeId, EpisodeNumber, Fidelity, MediaKind, TmdbId, TvScope, TvdbId,
};
use tracing::warn;

use crate::error::Result;

pub mod radarr;
pub mod sonarr;

pub use radarr::RadarrClient;
pub use sonarr::SonarrClient;

/// Reference to the upstream item an acquisition pipeline is about.
///
/// For television the configured scope travels with the reference so the
/// adapter can expand a single played unit into the season/series group it
/// was deduplicated at.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemRef {
    pub kind: MediaKind,
    pub fidelity: Fidelity,
    pub title: String,
    pub tmdb: Option<TmdbId>,
    pub tvdb: Option<TvdbId>,
    pub episode: Option<EpisodeNumber>,
    pub episode_id: Option<EpisodeId>,
    pub scope: TvScope,
}

/// Where an in-flight transfer currently stands, as reported by the manager.
#[derive(Debug, Clone, PartialEq)]
pub enum TransferStatus {
    /// Nothing queued and no file yet: a search may still be running.
    Pending,
    /// A transfer is queued or downloading.
    Active { progress: Option<f32> },
    /// The manager reports the media on disk. The path still has to be
    /// verified by the caller before the transfer counts as done.
    Completed { path: Option<PathBuf> },
    /// The manager dropped or errored the transfer, or the item disappeared.
    Vanished,
}

impl TransferStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, TransferStatus::Active { .. })
    }
}

/// Seam over one upstream content-manager instance.
#[async_trait]
pub trait AcquisitionClient: Send + Sync {
    /// Ensure the item exists upstream (adding it monitored when missing)
    /// and start a search at the item's scope.
    async fn trigger_search(&self, item: &ItemRef) -> Result<()>;

    /// Report the transfer status for the item's scope group.
    async fn transfer_status(&self, item: &ItemRef) -> Result<TransferStatus>;

    /// Remove the item from the manager.
    async fn remove(&self, item: &ItemRef) -> Result<()>;
}

/// One adapter per (kind, fidelity) present in the configuration.
#[derive(Clone)]
pub struct AdapterSet {
    movie: Arc<dyn AcquisitionClient>,
    movie_high: Option<Arc<dyn AcquisitionClient>>,
    tv: Arc<dyn AcquisitionClient>,
    tv_high: Option<Arc<dyn AcquisitionClient>>,
}

impl std::fmt::Debug for AdapterSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterSet")
            .field("movie_high", &self.movie_high.is_some())
            .field("tv_high", &self.tv_high.is_some())
            .finish()
    }
}

impl AdapterSet {
    pub fn new(
        movie: Arc<dyn AcquisitionClient>,
        movie_high: Option<Arc<dyn AcquisitionClient>>,
        tv: Arc<dyn AcquisitionClient>,
        tv_high: Option<Arc<dyn AcquisitionClient>>,
    ) -> Self {
        Self {
            movie,
            movie_high,
            tv,
            tv_high,
        }
    }

    /// Build the concrete Radarr/Sonarr-shaped clients from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.monitor.request_timeout;
        let movie = Arc::new(RadarrClient::new(
            &config.movie_manager.standard,
            config.libraries.movie_root.clone(),
            timeout,
        )?) as Arc<dyn AcquisitionClient>;
        let movie_high = match &config.movie_manager.high {
            Some(endpoint) => Some(Arc::new(RadarrClient::new(
                endpoint,
                config
                    .libraries
                    .movie_high_root
                    .clone()
                    .unwrap_or_else(|| config.libraries.movie_root.clone()),
                timeout,
            )?) as Arc<dyn AcquisitionClient>),
            None => None,
        };
        let tv = Arc::new(SonarrClient::new(
            &config.tv_manager.standard,
            config.libraries.tv_root.clone(),
            config.tv.clone(),
            timeout,
        )?) as Arc<dyn AcquisitionClient>;
        let tv_high = match &config.tv_manager.high {
            Some(endpoint) => Some(Arc::new(SonarrClient::new(
                endpoint,
                config
                    .libraries
                    .tv_high_root
                    .clone()
                    .unwrap_or_else(|| config.libraries.tv_root.clone()),
                config.tv.clone(),
                timeout,
            )?) as Arc<dyn AcquisitionClient>),
            None => None,
        };
        Ok(Self::new(movie, movie_high, tv, tv_high))
    }

    /// Select the adapter for an entry. A high-fidelity request without a
    /// configured high-fidelity instance falls back to the standard one.
    pub fn client_for(
        &self,
        kind: MediaKind,
        fidelity: Fidelity,
    ) -> Arc<dyn AcquisitionClient> {
        let (standard, high) = match kind {
            MediaKind::Movie => (&self.movie, &self.movie_high),
            MediaKind::Tv => (&self.tv, &self.tv_high),
        };
        match fidelity {
            Fidelity::Standard => Arc::clone(standard),
            Fidelity::High => match high {
                Some(client) => Arc::clone(client),
                None => {
                    warn!(
                        target: "acquisition::adapters",
                        kind = kind.as_str(),
                        "no high-fidelity instance configured, using standard"
                    );
                    Arc::clone(standard)
                }
            },
        }
    }
}
