//! Front-end catalog notification.
//!
//! A refresh is a best-effort hint that an entry's backing file changed; it
//! is never authoritative and its failure never affects lifecycle state.

use async_trait::async_trait;
use holdarr_config::CatalogConfig;
use holdarr_model::{Fidelity, MediaKind, SectionId};
use tracing::{debug, warn};

use crate::error::Result;

/// Which library section a refresh hint targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RefreshScope {
    pub kind: MediaKind,
    pub fidelity: Fidelity,
}

#[async_trait]
pub trait CatalogNotifier: Send + Sync {
    /// Fire-and-forget refresh hint. Implementations log failures and never
    /// propagate them.
    async fn refresh(&self, scope: RefreshScope);
}

/// Plex-shaped notifier hitting the section refresh endpoint.
#[derive(Debug, Clone)]
pub struct PlexNotifier {
    http: reqwest::Client,
    base: String,
    token: String,
    movie_section: SectionId,
    tv_section: SectionId,
}

impl PlexNotifier {
    pub fn new(config: &CatalogConfig, timeout: std::time::Duration) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: config.base_url.as_str().trim_end_matches('/').to_string(),
            token: config.token.clone(),
            movie_section: config.movie_section,
            tv_section: config.tv_section,
        })
    }
}

#[async_trait]
impl CatalogNotifier for PlexNotifier {
    async fn refresh(&self, scope: RefreshScope) {
        let section = match scope.kind {
            MediaKind::Movie => self.movie_section,
            MediaKind::Tv => self.tv_section,
        };
        let url = format!("{}/library/sections/{section}/refresh", self.base);
        match self
            .http
            .get(&url)
            .header("X-Plex-Token", &self.token)
            .send()
            .await
        {
            Ok(response) if response.status().is_success() => {
                debug!(target: "catalog::refresh", %section, "refresh hint sent");
            }
            Ok(response) => {
                warn!(
                    target: "catalog::refresh",
                    %section,
                    status = %response.status(),
                    "refresh hint rejected"
                );
            }
            Err(err) => {
                warn!(target: "catalog::refresh", %section, error = %err, "refresh hint failed");
            }
        }
    }
}
