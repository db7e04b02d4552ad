//! Sonarr-shaped TV manager client.
//!
//! Television acquisitions run at the configured scope: a played episode is
//! expanded into the episode-plus-lookahead window, the whole season, or the
//! whole series before episodes are monitored and searched.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use holdarr_config::{ManagerEndpoint, TvConfig};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use holdarr_model::{EpisodeNumber, TvScope};

use crate::error::{HoldError, Result};

use super::radarr::QueuePage;
use super::{AcquisitionClient, ItemRef, TransferStatus};

#[derive(Debug, Clone)]
pub struct SonarrClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
    root_folder: PathBuf,
    tv: TvConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrSeries {
    pub id: i64,
    pub tvdb_id: u64,
    pub title: String,
    #[serde(default)]
    pub monitored: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrEpisode {
    pub id: i64,
    pub season_number: u16,
    pub episode_number: u16,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub episode_file: Option<SonarrEpisodeFile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SonarrEpisodeFile {
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl SonarrEpisode {
    fn number(&self) -> EpisodeNumber {
        EpisodeNumber::new(self.season_number, self.episode_number)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeriesLookup {
    title: String,
    title_slug: String,
    tvdb_id: u64,
    #[serde(default)]
    year: Option<u16>,
    #[serde(default)]
    seasons: Vec<LookupSeason>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LookupSeason {
    season_number: u16,
}

#[derive(Debug, Clone, Deserialize)]
struct QualityProfile {
    id: i64,
}

/// Expand the played unit into the episode group the configured scope
/// covers.
///
/// Episode scope takes the played episode plus the lookahead window inside
/// its season; season scope takes the whole season, spilling into the next
/// season when the played unit is the season finale; series scope takes
/// everything.
fn scope_targets<'a>(
    episodes: &'a [SonarrEpisode],
    scope: TvScope,
    current: EpisodeNumber,
    lookahead: u16,
    include_specials: bool,
) -> Vec<&'a SonarrEpisode> {
    let allowed =
        |ep: &SonarrEpisode| include_specials || !ep.number().is_special();
    match scope {
        TvScope::Episode => {
            let window = lookahead.max(1);
            episodes
                .iter()
                .filter(|ep| {
                    ep.season_number == current.season
                        && ep.episode_number >= current.episode
                        && ep.episode_number < current.episode + window
                        && allowed(ep)
                })
                .collect()
        }
        TvScope::Season => {
            let season: Vec<&SonarrEpisode> = episodes
                .iter()
                .filter(|ep| ep.season_number == current.season)
                .collect();
            let last = season
                .iter()
                .map(|ep| ep.episode_number)
                .max()
                .unwrap_or_default();
            let next_season = current.season + 1;
            if current.episode == last
                && episodes.iter().any(|ep| ep.season_number == next_season)
            {
                return episodes
                    .iter()
                    .filter(|ep| {
                        ep.season_number == current.season
                            || ep.season_number == next_season
                    })
                    .collect();
            }
            season
        }
        TvScope::Series => episodes.iter().filter(|ep| allowed(ep)).collect(),
    }
}

impl SonarrClient {
    pub fn new(
        endpoint: &ManagerEndpoint,
        root_folder: PathBuf,
        tv: TvConfig,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: endpoint.base_url.as_str().trim_end_matches('/').to_string(),
            api_key: endpoint.api_key.clone(),
            root_folder,
            tv,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/api/v3/{path}", self.base)
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, url: String) -> Result<T> {
        let response = self
            .http
            .get(&url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HoldError::Upstream {
                endpoint: url,
                detail: format!("status {}", response.status()),
            });
        }
        Ok(response.json().await?)
    }

    async fn send_json(
        &self,
        method: reqwest::Method,
        url: String,
        body: &serde_json::Value,
    ) -> Result<reqwest::Response> {
        let response = self
            .http
            .request(method, &url)
            .header("X-Api-Key", &self.api_key)
            .json(body)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(HoldError::Upstream {
                endpoint: url,
                detail: format!("status {}", response.status()),
            });
        }
        Ok(response)
    }

    async fn series_by_tvdb(&self, tvdb: u64) -> Result<Option<SonarrSeries>> {
        let series: Vec<SonarrSeries> =
            self.get_json(self.url(&format!("series?tvdbId={tvdb}"))).await?;
        Ok(series.into_iter().find(|s| s.tvdb_id == tvdb))
    }

    async fn ensure_monitored(&self, series: &mut SonarrSeries) -> Result<()> {
        if series.monitored {
            return Ok(());
        }
        series.monitored = true;
        let body = serde_json::to_value(&*series)?;
        self.send_json(
            reqwest::Method::PUT,
            self.url(&format!("series/{}", series.id)),
            &body,
        )
        .await?;
        info!(target: "acquisition::sonarr", title = %series.title, "series marked monitored");
        Ok(())
    }

    async fn add_series(&self, tvdb: u64) -> Result<SonarrSeries> {
        let lookups: Vec<SeriesLookup> = self
            .get_json(self.url(&format!("series/lookup?term=tvdb:{tvdb}")))
            .await?;
        let lookup = lookups.into_iter().next().ok_or_else(|| {
            HoldError::NotFound(format!("tvdb:{tvdb} unknown to tv manager"))
        })?;
        let profiles: Vec<QualityProfile> =
            self.get_json(self.url("qualityprofile")).await?;
        let profile = profiles.first().ok_or_else(|| HoldError::Upstream {
            endpoint: self.url("qualityprofile"),
            detail: "no quality profiles defined".into(),
        })?;

        let seasons: Vec<serde_json::Value> = lookup
            .seasons
            .iter()
            .filter(|season| season.season_number > 0)
            .map(|season| {
                json!({ "seasonNumber": season.season_number, "monitored": true })
            })
            .collect();
        let payload = json!({
            "title": lookup.title,
            "titleSlug": lookup.title_slug,
            "tvdbId": lookup.tvdb_id,
            "year": lookup.year,
            "qualityProfileId": profile.id,
            "rootFolderPath": self.root_folder,
            "monitored": true,
            "addOptions": { "searchForMissingEpisodes": false },
            "seasons": seasons,
        });
        let response = self
            .send_json(reqwest::Method::POST, self.url("series"), &payload)
            .await?;
        let added: SonarrSeries = response.json().await?;
        info!(target: "acquisition::sonarr", title = %added.title, "series added");
        Ok(added)
    }

    async fn episodes(&self, series_id: i64, with_files: bool) -> Result<Vec<SonarrEpisode>> {
        let url = if with_files {
            self.url(&format!("episode?seriesId={series_id}&includeEpisodeFile=true"))
        } else {
            self.url(&format!("episode?seriesId={series_id}"))
        };
        self.get_json(url).await
    }

    fn tvdb_of(item: &ItemRef) -> Result<u64> {
        item.tvdb
            .map(|id| id.0)
            .ok_or_else(|| HoldError::Internal("tv item without tvdb id".into()))
    }

    fn current_of(item: &ItemRef) -> Result<EpisodeNumber> {
        item.episode.ok_or_else(|| {
            HoldError::Internal("tv item without episode coordinates".into())
        })
    }

    fn targets_for<'a>(
        &self,
        item: &ItemRef,
        episodes: &'a [SonarrEpisode],
    ) -> Result<Vec<&'a SonarrEpisode>> {
        let current = match item.scope {
            // Series scope needs no anchor unit.
            TvScope::Series => item.episode.unwrap_or(EpisodeNumber::new(1, 1)),
            _ => Self::current_of(item)?,
        };
        Ok(scope_targets(
            episodes,
            item.scope,
            current,
            self.tv.lookahead,
            self.tv.include_specials,
        ))
    }
}

#[async_trait]
impl AcquisitionClient for SonarrClient {
    async fn trigger_search(&self, item: &ItemRef) -> Result<()> {
        let tvdb = Self::tvdb_of(item)?;
        let mut series = match self.series_by_tvdb(tvdb).await? {
            Some(series) => series,
            None => self.add_series(tvdb).await?,
        };
        self.ensure_monitored(&mut series).await?;

        let episodes = self.episodes(series.id, false).await?;
        let targets = self.targets_for(item, &episodes)?;
        if targets.is_empty() {
            return Err(HoldError::NotFound(format!(
                "no episodes of {} match {} scope",
                series.title, item.scope
            )));
        }
        let ids: Vec<i64> = targets.iter().map(|ep| ep.id).collect();

        self.send_json(
            reqwest::Method::PUT,
            self.url("episode/monitor"),
            &json!({ "episodeIds": ids, "monitored": true }),
        )
        .await?;
        self.send_json(
            reqwest::Method::POST,
            self.url("command"),
            &json!({ "name": "EpisodeSearch", "episodeIds": ids }),
        )
        .await?;
        info!(
            target: "acquisition::sonarr",
            title = %series.title,
            scope = %item.scope,
            episodes = ids.len(),
            "episode search triggered"
        );
        Ok(())
    }

    async fn transfer_status(&self, item: &ItemRef) -> Result<TransferStatus> {
        let tvdb = Self::tvdb_of(item)?;
        let Some(series) = self.series_by_tvdb(tvdb).await? else {
            return Ok(TransferStatus::Vanished);
        };
        let episodes = self.episodes(series.id, true).await?;
        let targets = self.targets_for(item, &episodes)?;
        if targets.is_empty() {
            return Ok(TransferStatus::Vanished);
        }

        if targets.iter().all(|ep| ep.has_file) {
            // Report the played unit's file, falling back to any target's.
            let played = item.episode;
            let path = targets
                .iter()
                .find(|ep| Some(ep.number()) == played)
                .or_else(|| targets.first())
                .and_then(|ep| ep.episode_file.as_ref())
                .and_then(|file| file.path.clone());
            return Ok(TransferStatus::Completed { path });
        }

        let queue: QueuePage = self.get_json(self.url("queue")).await?;
        let target_ids: Vec<i64> = targets.iter().map(|ep| ep.id).collect();
        let records: Vec<_> = queue
            .records
            .iter()
            .filter(|record| {
                record
                    .episode_id
                    .is_some_and(|id| target_ids.contains(&id))
            })
            .collect();
        if records.is_empty() {
            return Ok(TransferStatus::Pending);
        }
        if records.iter().all(|record| record.is_failed()) {
            return Ok(TransferStatus::Vanished);
        }
        let fractions: Vec<f32> = records
            .iter()
            .filter_map(|record| record.fraction_done())
            .collect();
        let progress = if fractions.is_empty() {
            None
        } else {
            Some(fractions.iter().sum::<f32>() / fractions.len() as f32)
        };
        debug!(
            target: "acquisition::sonarr",
            title = %series.title,
            queued = records.len(),
            ?progress,
            "transfer active"
        );
        Ok(TransferStatus::Active { progress })
    }

    async fn remove(&self, item: &ItemRef) -> Result<()> {
        let tvdb = Self::tvdb_of(item)?;
        if let Some(series) = self.series_by_tvdb(tvdb).await? {
            let url = self.url(&format!("series/{}?deleteFiles=false", series.id));
            let response = self
                .http
                .delete(&url)
                .header("X-Api-Key", &self.api_key)
                .send()
                .await?;
            if !response.status().is_success() {
                return Err(HoldError::Upstream {
                    endpoint: url,
                    detail: format!("status {}", response.status()),
                });
            }
        }
        Ok(())
    }
}
