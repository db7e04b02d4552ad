//! Webhook payload parsing.
//!
//! Accepts the union of player-notification (Tautulli-shaped) and content
//! manager (Radarr/Sonarr-shaped) payloads and lowers them into the model's
//! inbound events. Unknown event types parse to nothing and are acknowledged
//! upstream. Template values the notification agent failed to substitute
//! (`"{tmdb_id}"` and friends) parse as absent; the resolver recovers those
//! ids from path markers.

use std::path::PathBuf;

use holdarr_model::{
    AddEvent, AddedEpisode, DeleteEvent, DeleteReason, EpisodeId,
    EpisodeNumber, ImportEvent, InboundEvent, MediaKind, PlayEvent, RatingKey,
    TmdbId, TvdbId,
};
use serde_json::Value;
use tracing::debug;

/// Parse one webhook body into the inbound events it carries.
pub fn parse_webhook(payload: &Value) -> Vec<InboundEvent> {
    let event_type = payload
        .get("event")
        .or_else(|| payload.get("eventType"))
        .and_then(Value::as_str)
        .unwrap_or("unknown")
        .to_ascii_lowercase();

    match event_type.as_str() {
        "playback.start" => parse_playback(payload).into_iter().collect(),
        "download" | "moviefileimported" | "episodefileimported" => {
            parse_imports(payload)
        }
        "moviefiledelete" => {
            parse_movie_delete(payload, DeleteReason::FileRemoved)
                .into_iter()
                .collect()
        }
        "moviedelete" => parse_movie_delete(payload, DeleteReason::EntryRemoved)
            .into_iter()
            .collect(),
        "episodefiledelete" => parse_episode_deletes(payload),
        "seriesdelete" => parse_series_delete(payload).into_iter().collect(),
        "movieadd" | "movieadded" => {
            parse_movie_add(payload).into_iter().collect()
        }
        "seriesadd" => parse_series_add(payload).into_iter().collect(),
        other => {
            debug!(target: "webhook::parse", event = other, "unhandled event type");
            Vec::new()
        }
    }
}

fn u64_of(value: &Value) -> Option<u64> {
    match value {
        Value::Number(number) => number.as_u64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

fn u16_of(value: &Value) -> Option<u16> {
    u64_of(value).and_then(|n| u16::try_from(n).ok())
}

fn i64_of(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(raw) => raw.trim().parse().ok(),
        _ => None,
    }
}

fn string_of(value: &Value) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|raw| !raw.is_empty())
        .map(str::to_string)
}

fn path_of(value: &Value) -> Option<PathBuf> {
    string_of(value).map(PathBuf::from)
}

fn parse_playback(payload: &Value) -> Option<InboundEvent> {
    let media = payload.get("media")?;
    let source_path = path_of(&media["file_info"]["path"])?;
    let ids = &media["ids"];
    let rating_key = string_of(&ids["plex"]).map(RatingKey);

    match media["type"].as_str()? {
        "movie" => Some(InboundEvent::Play(PlayEvent {
            kind: MediaKind::Movie,
            title: string_of(&media["title"]).unwrap_or_default(),
            tmdb: u64_of(&ids["tmdb"]).map(TmdbId),
            tvdb: None,
            episode: None,
            episode_id: None,
            rating_key,
            source_path,
        })),
        "episode" => {
            let episode = match (
                u16_of(&media["season_num"]),
                u16_of(&media["episode_num"]),
            ) {
                (Some(season), Some(number)) => {
                    Some(EpisodeNumber::new(season, number))
                }
                _ => None,
            };
            let title = string_of(&media["series_title"])
                .or_else(|| string_of(&media["title"]))
                .unwrap_or_default();
            Some(InboundEvent::Play(PlayEvent {
                kind: MediaKind::Tv,
                title,
                tmdb: None,
                tvdb: u64_of(&ids["tvdb"]).map(TvdbId),
                episode,
                episode_id: None,
                rating_key,
                source_path,
            }))
        }
        other => {
            debug!(target: "webhook::parse", media_type = other, "unsupported media type");
            None
        }
    }
}

fn parse_imports(payload: &Value) -> Vec<InboundEvent> {
    if let Some(movie) = payload.get("movie") {
        let Some(tmdb) = u64_of(&movie["tmdbId"]).map(TmdbId) else {
            return Vec::new();
        };
        return vec![InboundEvent::Import(ImportEvent {
            kind: MediaKind::Movie,
            title: string_of(&movie["title"]).unwrap_or_default(),
            year: u16_of(&movie["year"]),
            tmdb: Some(tmdb),
            tvdb: None,
            episode: None,
            episode_id: None,
            final_path: path_of(&payload["movieFile"]["path"]),
        })];
    }

    let Some(series) = payload.get("series") else {
        return Vec::new();
    };
    let tvdb = u64_of(&series["tvdbId"]).map(TvdbId);
    let title = string_of(&series["title"]).unwrap_or_default();
    let year = u16_of(&series["year"]);
    let final_path = path_of(&payload["episodeFile"]["path"]);

    episodes_of(payload)
        .into_iter()
        .map(|(number, episode_id)| {
            InboundEvent::Import(ImportEvent {
                kind: MediaKind::Tv,
                title: title.clone(),
                year,
                tmdb: None,
                tvdb,
                episode: Some(number),
                episode_id,
                final_path: final_path.clone(),
            })
        })
        .collect()
}

fn parse_movie_delete(payload: &Value, reason: DeleteReason) -> Option<InboundEvent> {
    let movie = payload.get("movie")?;
    let tmdb = u64_of(&movie["tmdbId"])
        .or_else(|| u64_of(&payload["remoteMovie"]["tmdbId"]))
        .map(TmdbId)?;
    Some(InboundEvent::Delete(DeleteEvent {
        kind: MediaKind::Movie,
        title: string_of(&movie["title"]).unwrap_or_default(),
        year: u16_of(&movie["year"]),
        tmdb: Some(tmdb),
        tvdb: None,
        episode: None,
        episode_id: None,
        reason,
    }))
}

fn parse_episode_deletes(payload: &Value) -> Vec<InboundEvent> {
    let Some(series) = payload.get("series") else {
        return Vec::new();
    };
    let tvdb = u64_of(&series["tvdbId"]).map(TvdbId);
    let title = string_of(&series["title"]).unwrap_or_default();
    let year = u16_of(&series["year"]);

    episodes_of(payload)
        .into_iter()
        .map(|(number, episode_id)| {
            InboundEvent::Delete(DeleteEvent {
                kind: MediaKind::Tv,
                title: title.clone(),
                year,
                tmdb: None,
                tvdb,
                episode: Some(number),
                episode_id,
                reason: DeleteReason::FileRemoved,
            })
        })
        .collect()
}

fn parse_series_delete(payload: &Value) -> Option<InboundEvent> {
    let series = payload.get("series")?;
    Some(InboundEvent::Delete(DeleteEvent {
        kind: MediaKind::Tv,
        title: string_of(&series["title"]).unwrap_or_default(),
        year: u16_of(&series["year"]),
        tmdb: None,
        tvdb: u64_of(&series["tvdbId"]).map(TvdbId),
        episode: None,
        episode_id: None,
        reason: DeleteReason::EntryRemoved,
    }))
}

fn parse_movie_add(payload: &Value) -> Option<InboundEvent> {
    let movie = payload.get("movie")?;
    let tmdb = u64_of(&movie["tmdbId"])
        .or_else(|| u64_of(&payload["remoteMovie"]["tmdbId"]))
        .map(TmdbId)?;
    Some(InboundEvent::Add(AddEvent {
        kind: MediaKind::Movie,
        title: string_of(&movie["title"]).unwrap_or_default(),
        year: u16_of(&movie["year"]),
        tmdb: Some(tmdb),
        tvdb: None,
        arr_id: i64_of(&movie["id"]).map(holdarr_model::ArrItemId),
        episodes: Vec::new(),
    }))
}

fn parse_series_add(payload: &Value) -> Option<InboundEvent> {
    let series = payload.get("series")?;
    let episodes = episodes_of(payload)
        .into_iter()
        .map(|(number, episode_id)| AddedEpisode { number, episode_id })
        .collect();
    Some(InboundEvent::Add(AddEvent {
        kind: MediaKind::Tv,
        title: string_of(&series["title"]).unwrap_or_default(),
        year: u16_of(&series["year"]),
        tmdb: None,
        tvdb: u64_of(&series["tvdbId"]).map(TvdbId),
        arr_id: i64_of(&series["id"]).map(holdarr_model::ArrItemId),
        episodes,
    }))
}

fn episodes_of(payload: &Value) -> Vec<(EpisodeNumber, Option<EpisodeId>)> {
    payload
        .get("episodes")
        .and_then(Value::as_array)
        .map(|episodes| {
            episodes
                .iter()
                .filter_map(|episode| {
                    let season = u16_of(&episode["seasonNumber"])?;
                    let number = u16_of(&episode["episodeNumber"])?;
                    Some((
                        EpisodeNumber::new(season, number),
                        i64_of(&episode["id"]).map(EpisodeId),
                    ))
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_movie_playback_with_template_ids() {
        let payload = json!({
            "event": "playback.start",
            "media": {
                "type": "movie",
                "title": "Film - Searching...",
                "ids": { "plex": "1201", "tmdb": "{tmdb_id}" },
                "file_info": {
                    "path": "/movies/Film (1999) {tmdb-550}/Film (1999) (dummy).mp4"
                }
            }
        });
        let events = parse_webhook(&payload);
        assert_eq!(events.len(), 1);
        let InboundEvent::Play(play) = &events[0] else {
            panic!("expected play event");
        };
        assert_eq!(play.kind, MediaKind::Movie);
        // The template value is absent; the resolver recovers it from the
        // path tag.
        assert_eq!(play.tmdb, None);
        assert!(play.source_path.ends_with("Film (1999) (dummy).mp4"));
    }

    #[test]
    fn parses_episode_playback() {
        let payload = json!({
            "event": "playback.start",
            "media": {
                "type": "episode",
                "title": "Show - S02E03 - Some Episode",
                "series_title": "Show",
                "season_num": "2",
                "episode_num": "3",
                "ids": { "plex": "88", "tvdb": 4242 },
                "file_info": {
                    "path": "/tv/Show (2020) {tvdb-4242}/Season 02/Show - s02e03 (dummy) [ID:31].mp4"
                }
            }
        });
        let events = parse_webhook(&payload);
        let InboundEvent::Play(play) = &events[0] else {
            panic!("expected play event");
        };
        assert_eq!(play.kind, MediaKind::Tv);
        assert_eq!(play.tvdb, Some(TvdbId(4242)));
        assert_eq!(play.episode, Some(EpisodeNumber::new(2, 3)));
        assert_eq!(play.title, "Show");
    }

    #[test]
    fn parses_movie_import() {
        let payload = json!({
            "eventType": "Download",
            "movie": { "id": 7, "tmdbId": 550, "title": "Film", "year": 1999 },
            "movieFile": { "path": "/movies/Film (1999)/Film.mkv" }
        });
        let events = parse_webhook(&payload);
        let InboundEvent::Import(import) = &events[0] else {
            panic!("expected import event");
        };
        assert_eq!(import.tmdb, Some(TmdbId(550)));
        assert_eq!(
            import.final_path.as_deref(),
            Some(std::path::Path::new("/movies/Film (1999)/Film.mkv"))
        );
    }

    #[test]
    fn parses_episode_import_per_episode() {
        let payload = json!({
            "eventType": "Download",
            "series": { "id": 3, "title": "Show", "tvdbId": 4242, "year": 2020 },
            "episodes": [
                { "id": 31, "seasonNumber": 2, "episodeNumber": 3, "title": "Ep" }
            ],
            "episodeFile": { "path": "/tv/Show/Season 02/Show - s02e03.mkv" }
        });
        let events = parse_webhook(&payload);
        assert_eq!(events.len(), 1);
        let InboundEvent::Import(import) = &events[0] else {
            panic!("expected import event");
        };
        assert_eq!(import.tvdb, Some(TvdbId(4242)));
        assert_eq!(import.episode, Some(EpisodeNumber::new(2, 3)));
        assert_eq!(import.episode_id, Some(EpisodeId(31)));
    }

    #[test]
    fn parses_file_deletes_and_entry_deletes_distinctly() {
        let file_delete = parse_webhook(&json!({
            "eventType": "MovieFileDelete",
            "movie": { "tmdbId": 550, "title": "Film", "year": 1999 }
        }));
        let InboundEvent::Delete(delete) = &file_delete[0] else {
            panic!("expected delete event");
        };
        assert_eq!(delete.reason, DeleteReason::FileRemoved);

        let entry_delete = parse_webhook(&json!({
            "eventType": "MovieDelete",
            "movie": { "tmdbId": 550, "title": "Film" }
        }));
        let InboundEvent::Delete(delete) = &entry_delete[0] else {
            panic!("expected delete event");
        };
        assert_eq!(delete.reason, DeleteReason::EntryRemoved);
    }

    #[test]
    fn parses_series_add_with_episodes() {
        let payload = json!({
            "eventType": "SeriesAdd",
            "series": { "id": 1, "title": "Test Series", "tvdbId": 9000, "year": 2023 },
            "episodes": [
                { "id": 100, "seasonNumber": 1, "episodeNumber": 1 },
                { "id": 101, "seasonNumber": 1, "episodeNumber": 2 }
            ]
        });
        let events = parse_webhook(&payload);
        let InboundEvent::Add(add) = &events[0] else {
            panic!("expected add event");
        };
        assert_eq!(add.tvdb, Some(TvdbId(9000)));
        assert_eq!(add.episodes.len(), 2);
        assert_eq!(add.episodes[1].episode_id, Some(EpisodeId(101)));
    }

    #[test]
    fn unknown_events_parse_to_nothing() {
        assert!(parse_webhook(&json!({ "eventType": "Health" })).is_empty());
        assert!(parse_webhook(&json!({})).is_empty());
    }
}
