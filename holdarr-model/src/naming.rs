//! On-disk naming conventions shared by the filesystem projection and the
//! entry resolver.
//!
//! Folders carry the upstream database id as a `{tmdb-…}` / `{tvdb-…}` tag so
//! identity survives title renames; stand-in files carry a `(dummy)` marker
//! and, for episodes, the upstream episode row id as `[ID:nnn]` so play
//! events can be mapped back without a metadata lookup.

use std::path::Path;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::ids::{EpisodeId, TmdbId, TvdbId};
use crate::media::EpisodeNumber;

/// Marker distinguishing stand-in files from real library files.
pub const PLACEHOLDER_MARKER: &str = "(dummy)";

static TMDB_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{tmdb-(\d+)\}").expect("tmdb tag regex"));
static TVDB_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{tvdb-(\d+)\}").expect("tvdb tag regex"));
static EPISODE_ID_TAG: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[ID:(\d+)\]").expect("episode id regex"));
static EPISODE_NUMBER_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[sS](\d{1,2})[eE](\d{1,2})").expect("episode number regex")
});
static FORBIDDEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[<>:"/\\|?*]"#).expect("forbidden chars regex"));

/// Strip characters that are unsafe in file names.
pub fn sanitize_title(raw: &str) -> String {
    FORBIDDEN.replace_all(raw, "").trim().to_string()
}

fn year_suffix(year: Option<u16>) -> String {
    year.map(|y| format!(" ({y})")).unwrap_or_default()
}

/// `"Title (2023) {tmdb-12345}"`
pub fn movie_folder(title: &str, year: Option<u16>, tmdb: TmdbId) -> String {
    format!(
        "{}{} {{tmdb-{}}}",
        sanitize_title(title),
        year_suffix(year),
        tmdb
    )
}

/// `"Title (2023) {tvdb-67890}"`
pub fn series_folder(title: &str, year: Option<u16>, tvdb: TvdbId) -> String {
    format!(
        "{}{} {{tvdb-{}}}",
        sanitize_title(title),
        year_suffix(year),
        tvdb
    )
}

/// `"Season 02"`
pub fn season_folder(season: u16) -> String {
    format!("Season {season:02}")
}

/// `"Title (2023) (dummy).mp4"`
pub fn movie_placeholder_file(title: &str, year: Option<u16>) -> String {
    format!(
        "{}{} {PLACEHOLDER_MARKER}.mp4",
        sanitize_title(title),
        year_suffix(year)
    )
}

/// `"Title - s01e05 (dummy) [ID:123].mp4"`; the id tag is omitted when the
/// upstream episode id is unknown.
pub fn episode_placeholder_file(
    title: &str,
    number: EpisodeNumber,
    episode_id: Option<EpisodeId>,
) -> String {
    match episode_id {
        Some(id) => format!(
            "{} - {number} {PLACEHOLDER_MARKER} [ID:{id}].mp4",
            sanitize_title(title)
        ),
        None => format!(
            "{} - {number} {PLACEHOLDER_MARKER}.mp4",
            sanitize_title(title)
        ),
    }
}

/// Whether a path names a stand-in representation.
pub fn is_placeholder_path(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.contains(PLACEHOLDER_MARKER))
}

pub fn extract_tmdb(text: &str) -> Option<TmdbId> {
    TMDB_TAG
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .map(TmdbId)
}

pub fn extract_tvdb(text: &str) -> Option<TvdbId> {
    TVDB_TAG
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .map(TvdbId)
}

pub fn extract_episode_id(text: &str) -> Option<EpisodeId> {
    EPISODE_ID_TAG
        .captures(text)
        .and_then(|c| c[1].parse().ok())
        .map(EpisodeId)
}

pub fn extract_episode_number(text: &str) -> Option<EpisodeNumber> {
    EPISODE_NUMBER_TAG.captures(text).and_then(|c| {
        let season = c[1].parse().ok()?;
        let episode = c[2].parse().ok()?;
        Some(EpisodeNumber::new(season, episode))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn folder_naming_convention() {
        assert_eq!(
            movie_folder("Test Movie", Some(2023), TmdbId(12345)),
            "Test Movie (2023) {tmdb-12345}"
        );
        assert_eq!(
            series_folder("Test Series", Some(2023), TvdbId(67890)),
            "Test Series (2023) {tvdb-67890}"
        );
        let special = movie_folder("Test: Movie?", Some(2023), TmdbId(1));
        assert!(!special.contains(':'));
        assert!(!special.contains('?'));
    }

    #[test]
    fn file_naming_convention() {
        assert_eq!(
            movie_placeholder_file("Test Movie", Some(2023)),
            "Test Movie (2023) (dummy).mp4"
        );
        assert_eq!(
            episode_placeholder_file(
                "Test Series",
                EpisodeNumber::new(1, 5),
                Some(EpisodeId(321))
            ),
            "Test Series - s01e05 (dummy) [ID:321].mp4"
        );
        assert_eq!(
            episode_placeholder_file("Test Series", EpisodeNumber::new(1, 5), None),
            "Test Series - s01e05 (dummy).mp4"
        );
    }

    #[test]
    fn extracts_ids_from_paths() {
        let path = "/tv/Show (2020) {tvdb-4242}/Season 02/Show - s02e03 (dummy) [ID:99].mp4";
        assert_eq!(extract_tvdb(path), Some(TvdbId(4242)));
        assert_eq!(extract_episode_id(path), Some(EpisodeId(99)));
        assert_eq!(
            extract_episode_number(path),
            Some(EpisodeNumber::new(2, 3))
        );
        assert_eq!(
            extract_tmdb("/movies/Film (1999) {tmdb-550}/Film (1999) (dummy).mp4"),
            Some(TmdbId(550))
        );
    }

    #[test]
    fn placeholder_marker_detection() {
        assert!(is_placeholder_path(&PathBuf::from(
            "/movies/Film (1999) {tmdb-550}/Film (1999) (dummy).mp4"
        )));
        assert!(!is_placeholder_path(&PathBuf::from(
            "/movies/Film (1999) {tmdb-550}/Film (1999).mkv"
        )));
    }
}
