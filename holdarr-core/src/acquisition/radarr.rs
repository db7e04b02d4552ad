//! Radarr-shaped movie manager client.

use std::path::PathBuf;
use std::time::Duration;

use async_trait::async_trait;
use holdarr_config::ManagerEndpoint;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info};

use crate::error::{HoldError, Result};

use super::{AcquisitionClient, ItemRef, TransferStatus};

#[derive(Debug, Clone)]
pub struct RadarrClient {
    http: reqwest::Client,
    base: String,
    api_key: String,
    root_folder: PathBuf,
}

/// Movie record as returned by the manager. Unknown fields are kept in
/// `extra` so monitored-flag updates can round-trip the full object.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarrMovie {
    pub id: i64,
    pub tmdb_id: u64,
    pub title: String,
    #[serde(default)]
    pub monitored: bool,
    #[serde(default)]
    pub has_file: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub movie_file: Option<RadarrMovieFile>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RadarrMovieFile {
    #[serde(default)]
    pub path: Option<PathBuf>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MovieLookup {
    title: String,
    tmdb_id: u64,
    #[serde(default)]
    year: Option<u16>,
}

#[derive(Debug, Clone, Deserialize)]
struct QualityProfile {
    id: i64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueuePage {
    #[serde(default)]
    pub records: Vec<QueueRecord>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueRecord {
    #[serde(default)]
    pub movie_id: Option<i64>,
    #[serde(default)]
    pub episode_id: Option<i64>,
    #[serde(default)]
    pub size: f64,
    #[serde(default)]
    pub sizeleft: f64,
    #[serde(default)]
    pub status: Option<String>,
}

impl QueueRecord {
    pub fn fraction_done(&self) -> Option<f32> {
        if self.size > 0.0 {
            Some((1.0 - self.sizeleft / self.size) as f32)
        } else {
            None
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status.as_deref() == Some("failed")
    }
}

impl RadarrClient {
    pub fn new(
        endpoint: &ManagerEndpoint,
        root_folder: PathBuf,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base: endpoint.base_url.as_str().trim_end_matches('/').to_string(),
            api_key: endpoint.api_key.clone(),
            root_folder,
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

    async fn movie_by_tmdb(&self, tmdb: u64) -> Result<Option<RadarrMovie>> {
        let movies: Vec<RadarrMovie> =
            self.get_json(self.url(&format!("movie?tmdbId={tmdb}"))).await?;
        Ok(movies.into_iter().find(|movie| movie.tmdb_id == tmdb))
    }

    async fn ensure_monitored(&self, movie: &mut RadarrMovie) -> Result<()> {
        if movie.monitored {
            return Ok(());
        }
        movie.monitored = true;
        let body = serde_json::to_value(&*movie)?;
        self.send_json(
            reqwest::Method::PUT,
            self.url(&format!("movie/{}", movie.id)),
            &body,
        )
        .await?;
        info!(target: "acquisition::radarr", title = %movie.title, "movie marked monitored");
        Ok(())
    }

    async fn add_movie(&self, tmdb: u64) -> Result<RadarrMovie> {
        let lookups: Vec<MovieLookup> = self
            .get_json(self.url(&format!("movie/lookup?term=tmdb:{tmdb}")))
            .await?;
        let lookup = lookups.into_iter().next().ok_or_else(|| {
            HoldError::NotFound(format!("tmdb:{tmdb} unknown to movie manager"))
        })?;
        let profiles: Vec<QualityProfile> =
            self.get_json(self.url("qualityprofile")).await?;
        let profile = profiles.first().ok_or_else(|| HoldError::Upstream {
            endpoint: self.url("qualityprofile"),
            detail: "no quality profiles defined".into(),
        })?;

        let payload = json!({
            "title": lookup.title,
            "tmdbId": lookup.tmdb_id,
            "year": lookup.year,
            "qualityProfileId": profile.id,
            "rootFolderPath": self.root_folder,
            "monitored": true,
            "addOptions": { "searchForMovie": false, "addMethod": "manual" },
        });
        let response = self
            .send_json(reqwest::Method::POST, self.url("movie"), &payload)
            .await?;
        let added: RadarrMovie = response.json().await?;
        info!(target: "acquisition::radarr", title = %added.title, "movie added");
        Ok(added)
    }

    fn tmdb_of(item: &ItemRef) -> Result<u64> {
        item.tmdb
            .map(|id| id.0)
            .ok_or_else(|| HoldError::Internal("movie item without tmdb id".into()))
    }
}

#[async_trait]
impl AcquisitionClient for RadarrClient {
    async fn trigger_search(&self, item: &ItemRef) -> Result<()> {
        let tmdb = Self::tmdb_of(item)?;
        let movie = match self.movie_by_tmdb(tmdb).await? {
            Some(mut movie) => {
                self.ensure_monitored(&mut movie).await?;
                movie
            }
            None => self.add_movie(tmdb).await?,
        };
        let command = json!({ "name": "MoviesSearch", "movieIds": [movie.id] });
        self.send_json(reqwest::Method::POST, self.url("command"), &command)
            .await?;
        info!(
            target: "acquisition::radarr",
            title = %movie.title,
            movie_id = movie.id,
            "search triggered"
        );
        Ok(())
    }

    async fn transfer_status(&self, item: &ItemRef) -> Result<TransferStatus> {
        let tmdb = Self::tmdb_of(item)?;
        let Some(movie) = self.movie_by_tmdb(tmdb).await? else {
            return Ok(TransferStatus::Vanished);
        };
        if movie.has_file {
            let path = movie.movie_file.and_then(|file| file.path);
            return Ok(TransferStatus::Completed { path });
        }

        let queue: QueuePage = self.get_json(self.url("queue")).await?;
        let records: Vec<&QueueRecord> = queue
            .records
            .iter()
            .filter(|record| record.movie_id == Some(movie.id))
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
            target: "acquisition::radarr",
            title = %movie.title,
            ?progress,
            "transfer active"
        );
        Ok(TransferStatus::Active { progress })
    }

    async fn remove(&self, item: &ItemRef) -> Result<()> {
        let tmdb = Self::tmdb_of(item)?;
        if let Some(movie) = self.movie_by_tmdb(tmdb).await? {
            let url = self.url(&format!("movie/{}?deleteFiles=false", movie.id));
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn movie_record_round_trips_unknown_fields() {
        let raw = serde_json::json!({
            "id": 12,
            "tmdbId": 550,
            "title": "Fight Club",
            "monitored": false,
            "hasFile": true,
            "movieFile": { "path": "/movies/Fight Club (1999)/fc.mkv", "size": 123 },
            "qualityProfileId": 7,
            "rootFolderPath": "/movies"
        });
        let mut movie: RadarrMovie = serde_json::from_value(raw).unwrap();
        assert_eq!(movie.tmdb_id, 550);
        assert!(movie.has_file);
        assert_eq!(
            movie.movie_file.as_ref().unwrap().path.as_deref(),
            Some(std::path::Path::new("/movies/Fight Club (1999)/fc.mkv"))
        );

        movie.monitored = true;
        let back = serde_json::to_value(&movie).unwrap();
        assert_eq!(back["qualityProfileId"], 7);
        assert_eq!(back["monitored"], true);
    }

    #[test]
    fn queue_record_progress() {
        let page: QueuePage = serde_json::from_value(serde_json::json!({
            "records": [
                { "movieId": 12, "size": 1000.0, "sizeleft": 250.0, "status": "downloading" }
            ]
        }))
        .unwrap();
        let record = &page.records[0];
        assert_eq!(record.movie_id, Some(12));
        assert!((record.fraction_done().unwrap() - 0.75).abs() < f32::EPSILON);
        assert!(!record.is_failed());
    }
}
