use std::path::{Path, PathBuf};
use std::time::Duration;

use holdarr_model::{Fidelity, MediaKind, SectionId, TvScope};
use url::Url;

use crate::error::ConfigError;

/// Top-level configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub movie_manager: ManagerPair,
    pub tv_manager: ManagerPair,
    pub libraries: LibraryConfig,
    pub placeholder: PlaceholderConfig,
    pub monitor: MonitorConfig,
    pub tv: TvConfig,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Front-end catalog (Plex) connection details.
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    pub base_url: Url,
    pub token: String,
    pub movie_section: SectionId,
    pub tv_section: SectionId,
}

impl CatalogConfig {
    pub fn section_for(&self, kind: MediaKind) -> SectionId {
        match kind {
            MediaKind::Movie => self.movie_section,
            MediaKind::Tv => self.tv_section,
        }
    }
}

/// One upstream content-manager endpoint.
#[derive(Debug, Clone)]
pub struct ManagerEndpoint {
    pub base_url: Url,
    pub api_key: String,
}

/// A standard endpoint plus the optional high-fidelity sibling instance.
#[derive(Debug, Clone)]
pub struct ManagerPair {
    pub standard: ManagerEndpoint,
    pub high: Option<ManagerEndpoint>,
}

impl ManagerPair {
    pub fn endpoint(&self, fidelity: Fidelity) -> Option<&ManagerEndpoint> {
        match fidelity {
            Fidelity::Standard => Some(&self.standard),
            Fidelity::High => self.high.as_ref(),
        }
    }
}

/// Library roots per media kind and fidelity. High-fidelity roots double as
/// the fidelity detector for played paths.
#[derive(Debug, Clone)]
pub struct LibraryConfig {
    pub movie_root: PathBuf,
    pub tv_root: PathBuf,
    pub movie_high_root: Option<PathBuf>,
    pub tv_high_root: Option<PathBuf>,
}

impl LibraryConfig {
    pub fn root_for(&self, kind: MediaKind, fidelity: Fidelity) -> &Path {
        match (kind, fidelity) {
            (MediaKind::Movie, Fidelity::Standard) => &self.movie_root,
            (MediaKind::Tv, Fidelity::Standard) => &self.tv_root,
            (MediaKind::Movie, Fidelity::High) => {
                self.movie_high_root.as_deref().unwrap_or(&self.movie_root)
            }
            (MediaKind::Tv, Fidelity::High) => {
                self.tv_high_root.as_deref().unwrap_or(&self.tv_root)
            }
        }
    }

    /// Detect the pipeline a played path belongs to. High-fidelity roots win
    /// when they prefix the path.
    pub fn fidelity_of(&self, path: &Path) -> Fidelity {
        let high = self
            .movie_high_root
            .as_deref()
            .is_some_and(|root| path.starts_with(root))
            || self
                .tv_high_root
                .as_deref()
                .is_some_and(|root| path.starts_with(root));
        if high { Fidelity::High } else { Fidelity::Standard }
    }

    pub fn roots(&self) -> impl Iterator<Item = &Path> {
        [
            Some(self.movie_root.as_path()),
            Some(self.tv_root.as_path()),
            self.movie_high_root.as_deref(),
            self.tv_high_root.as_deref(),
        ]
        .into_iter()
        .flatten()
    }
}

/// How stand-in files are materialised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStrategy {
    /// Hard-link every stand-in to one shared source file. Requires source
    /// and targets on the same volume; violations are configuration errors.
    Hardlink,
    /// Full copy of the source file.
    Copy,
}

impl PlaceholderStrategy {
    pub fn parse(raw: &str, var: &'static str) -> Result<Self, ConfigError> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "hardlink" => Ok(PlaceholderStrategy::Hardlink),
            "copy" => Ok(PlaceholderStrategy::Copy),
            other => Err(ConfigError::InvalidVar {
                var,
                reason: format!(
                    "placeholder strategy must be hardlink or copy, got {other}"
                ),
            }),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            PlaceholderStrategy::Hardlink => "hardlink",
            PlaceholderStrategy::Copy => "copy",
        }
    }
}

#[derive(Debug, Clone)]
pub struct PlaceholderConfig {
    /// The single shared stand-in source file.
    pub source_file: PathBuf,
    pub strategy: PlaceholderStrategy,
}

/// Bounds for the transfer monitor's polling loop. Both the attempt count
/// and the wall-clock cap are enforced; whichever is reached first stops the
/// loop.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub poll_interval: Duration,
    pub max_poll_attempts: u32,
    pub max_monitor_time: Duration,
    /// Upper bound for any single upstream request issued by the adapters.
    pub request_timeout: Duration,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(3),
            max_poll_attempts: 1000,
            max_monitor_time: Duration::from_secs(120),
            request_timeout: Duration::from_secs(10),
        }
    }
}

/// Television acquisition policy.
#[derive(Debug, Clone)]
pub struct TvConfig {
    pub scope: TvScope,
    /// In episode scope, how many upcoming episodes to acquire alongside the
    /// played one.
    pub lookahead: u16,
    /// Whether season 0 entries participate in lookahead expansion.
    pub include_specials: bool,
}

impl Default for TvConfig {
    fn default() -> Self {
        Self {
            scope: TvScope::Episode,
            lookahead: 3,
            include_specials: false,
        }
    }
}
