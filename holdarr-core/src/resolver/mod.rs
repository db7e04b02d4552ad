//! Maps inbound events onto canonical entry identities.
//!
//! Resolution misses are expected (events routinely reference media outside
//! the managed placeholder libraries) and surface as `None`, never as an
//! error.

use std::path::{Path, PathBuf};

use holdarr_config::{LibraryConfig, TvConfig};
use holdarr_model::naming;
use holdarr_model::{
    AddEvent, DeleteEvent, EntryKey, EpisodeId, EpisodeNumber, Fidelity,
    ImportEvent, InboundEvent, MediaKind, PlayEvent, TmdbId, TvScope, TvdbId,
};
use tracing::debug;

use crate::acquisition::ItemRef;

/// One inbound event resolved to a concrete entry.
#[derive(Debug, Clone)]
pub struct ResolvedEntry {
    pub key: EntryKey,
    pub item: ItemRef,
    /// The stand-in's on-disk location; for group-scoped television entries
    /// this is the played (or reported) unit's path.
    pub target_path: PathBuf,
    pub title: String,
}

#[derive(Debug, Clone)]
pub struct EntryResolver {
    libraries: LibraryConfig,
    tv: TvConfig,
}

impl EntryResolver {
    pub fn new(libraries: LibraryConfig, tv: TvConfig) -> Self {
        Self { libraries, tv }
    }

    /// Resolve any single-entry event. Pre-seeding add events expand to many
    /// entries; use [`EntryResolver::resolve_add`] for those.
    pub fn resolve(&self, event: &InboundEvent) -> Option<ResolvedEntry> {
        match event {
            InboundEvent::Play(play) => self.resolve_play(play),
            InboundEvent::Import(import) => self.resolve_import(import),
            InboundEvent::Delete(delete) => self.resolve_delete(delete),
            InboundEvent::Add(add) => self.resolve_add(add).into_iter().next(),
        }
    }

    /// Play events only count when the played path identifies a stand-in.
    pub fn resolve_play(&self, event: &PlayEvent) -> Option<ResolvedEntry> {
        if !naming::is_placeholder_path(&event.source_path) {
            debug!(
                target: "resolver::play",
                path = %event.source_path.display(),
                "not a stand-in, ignoring"
            );
            return None;
        }
        let path_str = event.source_path.to_string_lossy();
        let fidelity = self.libraries.fidelity_of(&event.source_path);

        match event.kind {
            MediaKind::Movie => {
                // The notification agent sometimes substitutes template
                // values; the folder tag is the fallback source of truth.
                let tmdb = event.tmdb.or_else(|| naming::extract_tmdb(&path_str))?;
                Some(ResolvedEntry {
                    key: EntryKey::movie(tmdb, fidelity),
                    item: self.movie_item(tmdb, fidelity, &event.title),
                    target_path: event.source_path.clone(),
                    title: event.title.clone(),
                })
            }
            MediaKind::Tv => {
                let tvdb = event.tvdb.or_else(|| naming::extract_tvdb(&path_str))?;
                let number = event
                    .episode
                    .or_else(|| naming::extract_episode_number(&path_str));
                let number = match (number, self.tv.scope) {
                    (Some(number), _) => number,
                    (None, TvScope::Series) => EpisodeNumber::new(1, 1),
                    (None, _) => {
                        debug!(
                            target: "resolver::play",
                            path = %event.source_path.display(),
                            "episode coordinates unavailable"
                        );
                        return None;
                    }
                };
                let episode_id = event
                    .episode_id
                    .or_else(|| naming::extract_episode_id(&path_str));
                Some(ResolvedEntry {
                    key: EntryKey::tv_scoped(tvdb, fidelity, self.tv.scope, number),
                    item: self.tv_item(tvdb, fidelity, &event.title, number, episode_id),
                    target_path: event.source_path.clone(),
                    title: event.title.clone(),
                })
            }
        }
    }

    /// Imports resolve to the stand-in they are about to replace. An import
    /// with no stand-in on disk is a miss: the media was never projected.
    pub fn resolve_import(&self, event: &ImportEvent) -> Option<ResolvedEntry> {
        match event.kind {
            MediaKind::Movie => {
                let tmdb = event.tmdb.or_else(|| {
                    event
                        .final_path
                        .as_ref()
                        .and_then(|p| naming::extract_tmdb(&p.to_string_lossy()))
                })?;
                let (fidelity, target) =
                    self.locate_movie_placeholder(tmdb, event.final_path.as_deref())?;
                Some(ResolvedEntry {
                    key: EntryKey::movie(tmdb, fidelity),
                    item: self.movie_item(tmdb, fidelity, &event.title),
                    target_path: target,
                    title: event.title.clone(),
                })
            }
            MediaKind::Tv => {
                let tvdb = event.tvdb?;
                let number = event.episode?;
                let (fidelity, target) = self.locate_episode_placeholder(
                    tvdb,
                    number,
                    event.final_path.as_deref(),
                )?;
                Some(ResolvedEntry {
                    key: EntryKey::tv_scoped(tvdb, fidelity, self.tv.scope, number),
                    item: self.tv_item(
                        tvdb,
                        fidelity,
                        &event.title,
                        number,
                        event.episode_id,
                    ),
                    target_path: target,
                    title: event.title.clone(),
                })
            }
        }
    }

    /// Deletes resolve even when nothing is left on disk: the target path is
    /// reconstructed from the naming conventions so the stand-in can be
    /// reinstalled.
    pub fn resolve_delete(&self, event: &DeleteEvent) -> Option<ResolvedEntry> {
        match event.kind {
            MediaKind::Movie => {
                let tmdb = event.tmdb?;
                let (fidelity, target) = self
                    .locate_movie_placeholder(tmdb, None)
                    .unwrap_or_else(|| {
                        let root =
                            self.libraries.root_for(MediaKind::Movie, Fidelity::Standard);
                        let dir = root
                            .join(naming::movie_folder(&event.title, event.year, tmdb));
                        (
                            Fidelity::Standard,
                            dir.join(naming::movie_placeholder_file(
                                &event.title,
                                event.year,
                            )),
                        )
                    });
                Some(ResolvedEntry {
                    key: EntryKey::movie(tmdb, fidelity),
                    item: self.movie_item(tmdb, fidelity, &event.title),
                    target_path: target,
                    title: event.title.clone(),
                })
            }
            MediaKind::Tv => {
                let tvdb = event.tvdb?;
                let Some(number) = event.episode else {
                    // Whole-series removal: the entry is the series folder.
                    return self.resolve_series_removal(event, tvdb);
                };
                let (fidelity, target) = self
                    .locate_episode_placeholder(tvdb, number, None)
                    .unwrap_or_else(|| {
                        let root =
                            self.libraries.root_for(MediaKind::Tv, Fidelity::Standard);
                        let dir = root
                            .join(naming::series_folder(&event.title, event.year, tvdb))
                            .join(naming::season_folder(number.season));
                        (
                            Fidelity::Standard,
                            dir.join(naming::episode_placeholder_file(
                                &event.title,
                                number,
                                event.episode_id,
                            )),
                        )
                    });
                Some(ResolvedEntry {
                    key: EntryKey::tv_scoped(tvdb, fidelity, self.tv.scope, number),
                    item: self.tv_item(
                        tvdb,
                        fidelity,
                        &event.title,
                        number,
                        event.episode_id,
                    ),
                    target_path: target,
                    title: event.title.clone(),
                })
            }
        }
    }

    fn resolve_series_removal(
        &self,
        event: &DeleteEvent,
        tvdb: TvdbId,
    ) -> Option<ResolvedEntry> {
        if event.reason != holdarr_model::DeleteReason::EntryRemoved {
            debug!(
                target: "resolver::delete",
                %tvdb,
                "file delete without episode coordinates, ignoring"
            );
            return None;
        }
        let mut found = None;
        for fidelity in [Fidelity::Standard, Fidelity::High] {
            let root = self.libraries.root_for(MediaKind::Tv, fidelity);
            if let Some(dir) = find_dir_by_tag(root, |name| {
                naming::extract_tvdb(name) == Some(tvdb)
            }) {
                found = Some((fidelity, dir));
                break;
            }
        }
        let (fidelity, target) = found.unwrap_or_else(|| {
            let root = self.libraries.root_for(MediaKind::Tv, Fidelity::Standard);
            (
                Fidelity::Standard,
                root.join(naming::series_folder(&event.title, event.year, tvdb)),
            )
        });
        Some(ResolvedEntry {
            key: EntryKey::Series { tvdb, fidelity },
            item: self.tv_item(
                tvdb,
                fidelity,
                &event.title,
                EpisodeNumber::new(1, 1),
                None,
            ),
            target_path: target,
            title: event.title.clone(),
        })
    }

    /// Pre-seeding: expand an add event into the stand-ins it should
    /// install. Adds arrive from the standard instances.
    pub fn resolve_add(&self, event: &AddEvent) -> Vec<ResolvedEntry> {
        match event.kind {
            MediaKind::Movie => {
                let Some(tmdb) = event.tmdb else {
                    return Vec::new();
                };
                let root = self.libraries.root_for(MediaKind::Movie, Fidelity::Standard);
                let target = root
                    .join(naming::movie_folder(&event.title, event.year, tmdb))
                    .join(naming::movie_placeholder_file(&event.title, event.year));
                vec![ResolvedEntry {
                    key: EntryKey::movie(tmdb, Fidelity::Standard),
                    item: self.movie_item(tmdb, Fidelity::Standard, &event.title),
                    target_path: target,
                    title: event.title.clone(),
                }]
            }
            MediaKind::Tv => {
                let Some(tvdb) = event.tvdb else {
                    return Vec::new();
                };
                let root = self.libraries.root_for(MediaKind::Tv, Fidelity::Standard);
                let series_dir =
                    root.join(naming::series_folder(&event.title, event.year, tvdb));
                event
                    .episodes
                    .iter()
                    .map(|episode| ResolvedEntry {
                        key: EntryKey::tv_scoped(
                            tvdb,
                            Fidelity::Standard,
                            self.tv.scope,
                            episode.number,
                        ),
                        item: self.tv_item(
                            tvdb,
                            Fidelity::Standard,
                            &event.title,
                            episode.number,
                            episode.episode_id,
                        ),
                        target_path: series_dir
                            .join(naming::season_folder(episode.number.season))
                            .join(naming::episode_placeholder_file(
                                &event.title,
                                episode.number,
                                episode.episode_id,
                            )),
                        title: event.title.clone(),
                    })
                    .collect()
            }
        }
    }

    fn movie_item(&self, tmdb: TmdbId, fidelity: Fidelity, title: &str) -> ItemRef {
        ItemRef {
            kind: MediaKind::Movie,
            fidelity,
            title: title.to_string(),
            tmdb: Some(tmdb),
            tvdb: None,
            episode: None,
            episode_id: None,
            scope: TvScope::Episode,
        }
    }

    fn tv_item(
        &self,
        tvdb: TvdbId,
        fidelity: Fidelity,
        title: &str,
        number: EpisodeNumber,
        episode_id: Option<EpisodeId>,
    ) -> ItemRef {
        ItemRef {
            kind: MediaKind::Tv,
            fidelity,
            title: title.to_string(),
            tmdb: None,
            tvdb: Some(tvdb),
            episode: Some(number),
            episode_id,
            scope: self.tv.scope,
        }
    }

    fn fidelities_to_search(&self, hint: Option<&Path>) -> Vec<Fidelity> {
        match hint {
            Some(path) => vec![self.libraries.fidelity_of(path)],
            None => vec![Fidelity::Standard, Fidelity::High],
        }
    }

    fn locate_movie_placeholder(
        &self,
        tmdb: TmdbId,
        hint: Option<&Path>,
    ) -> Option<(Fidelity, PathBuf)> {
        for fidelity in self.fidelities_to_search(hint) {
            let root = self.libraries.root_for(MediaKind::Movie, fidelity);
            let Some(dir) = find_dir_by_tag(root, |name| {
                naming::extract_tmdb(name) == Some(tmdb)
            }) else {
                continue;
            };
            if let Some(file) = find_placeholder_file(&dir, None) {
                return Some((fidelity, file));
            }
        }
        None
    }

    fn locate_episode_placeholder(
        &self,
        tvdb: TvdbId,
        number: EpisodeNumber,
        hint: Option<&Path>,
    ) -> Option<(Fidelity, PathBuf)> {
        for fidelity in self.fidelities_to_search(hint) {
            let root = self.libraries.root_for(MediaKind::Tv, fidelity);
            let Some(series_dir) = find_dir_by_tag(root, |name| {
                naming::extract_tvdb(name) == Some(tvdb)
            }) else {
                continue;
            };
            let season_dir = series_dir.join(naming::season_folder(number.season));
            if let Some(file) = find_placeholder_file(&season_dir, Some(number)) {
                return Some((fidelity, file));
            }
        }
        None
    }
}

fn find_dir_by_tag(
    root: &Path,
    matches: impl Fn(&str) -> bool,
) -> Option<PathBuf> {
    let entries = std::fs::read_dir(root).ok()?;
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if matches(&name) && entry.path().is_dir() {
            return Some(entry.path());
        }
    }
    None
}

fn find_placeholder_file(
    dir: &Path,
    unit: Option<EpisodeNumber>,
) -> Option<PathBuf> {
    let entries = std::fs::read_dir(dir).ok()?;
    let mut candidates: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| naming::is_placeholder_path(path))
        .filter(|path| match unit {
            Some(number) => path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.to_ascii_lowercase().contains(&number.to_string())),
            None => true,
        })
        .collect();
    candidates.sort();
    candidates.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdarr_model::RatingKey;
    use std::fs;

    fn resolver(temp: &Path, scope: TvScope) -> EntryResolver {
        let movie_root = temp.join("movies");
        let tv_root = temp.join("tv");
        let movie_high = temp.join("movies-4k");
        fs::create_dir_all(&movie_root).unwrap();
        fs::create_dir_all(&tv_root).unwrap();
        fs::create_dir_all(&movie_high).unwrap();
        EntryResolver::new(
            LibraryConfig {
                movie_root,
                tv_root,
                movie_high_root: Some(movie_high),
                tv_high_root: None,
            },
            TvConfig {
                scope,
                ..TvConfig::default()
            },
        )
    }

    fn play_event(kind: MediaKind, path: &Path) -> PlayEvent {
        PlayEvent {
            kind,
            title: "Test".into(),
            tmdb: None,
            tvdb: None,
            episode: None,
            episode_id: None,
            rating_key: Some(RatingKey("99".into())),
            source_path: path.to_path_buf(),
        }
    }

    #[test]
    fn ignores_plays_of_real_files() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = resolver(temp.path(), TvScope::Episode);
        let event = play_event(
            MediaKind::Movie,
            &temp.path().join("movies/Film (1999) {tmdb-550}/Film (1999).mkv"),
        );
        assert!(resolver.resolve_play(&event).is_none());
    }

    #[test]
    fn recovers_movie_identity_from_path_tags() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = resolver(temp.path(), TvScope::Episode);
        let path = temp
            .path()
            .join("movies/Film (1999) {tmdb-550}/Film (1999) (dummy).mp4");
        let resolved = resolver
            .resolve_play(&play_event(MediaKind::Movie, &path))
            .expect("placeholder play resolves");
        assert_eq!(
            resolved.key,
            EntryKey::movie(TmdbId(550), Fidelity::Standard)
        );
        assert_eq!(resolved.target_path, path);
    }

    #[test]
    fn detects_high_fidelity_from_library_root() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = resolver(temp.path(), TvScope::Episode);
        let path = temp
            .path()
            .join("movies-4k/Film (1999) {tmdb-550}/Film (1999) (dummy).mp4");
        let resolved = resolver
            .resolve_play(&play_event(MediaKind::Movie, &path))
            .unwrap();
        assert_eq!(resolved.key.fidelity(), Fidelity::High);
    }

    #[test]
    fn season_scope_collapses_sibling_episodes_to_one_key() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = resolver(temp.path(), TvScope::Season);
        let base = temp.path().join("tv/Show (2020) {tvdb-4242}/Season 02");
        let a = resolver
            .resolve_play(&play_event(
                MediaKind::Tv,
                &base.join("Show - s02e03 (dummy) [ID:31].mp4"),
            ))
            .unwrap();
        let b = resolver
            .resolve_play(&play_event(
                MediaKind::Tv,
                &base.join("Show - s02e05 (dummy) [ID:33].mp4"),
            ))
            .unwrap();
        assert_eq!(a.key, b.key);
        assert_ne!(a.target_path, b.target_path);
    }

    #[test]
    fn import_locates_the_on_disk_stand_in() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = resolver(temp.path(), TvScope::Episode);
        let dir = temp.path().join("movies/Film (1999) {tmdb-550}");
        fs::create_dir_all(&dir).unwrap();
        let placeholder = dir.join("Film (1999) (dummy).mp4");
        fs::write(&placeholder, b"stub").unwrap();

        let event = ImportEvent {
            kind: MediaKind::Movie,
            title: "Film".into(),
            year: Some(1999),
            tmdb: Some(TmdbId(550)),
            tvdb: None,
            episode: None,
            episode_id: None,
            final_path: None,
        };
        let resolved = resolver.resolve_import(&event).unwrap();
        assert_eq!(resolved.target_path, placeholder);
    }

    #[test]
    fn import_without_stand_in_is_a_miss() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = resolver(temp.path(), TvScope::Episode);
        let event = ImportEvent {
            kind: MediaKind::Movie,
            title: "Unmanaged".into(),
            year: None,
            tmdb: Some(TmdbId(777)),
            tvdb: None,
            episode: None,
            episode_id: None,
            final_path: None,
        };
        assert!(resolver.resolve_import(&event).is_none());
    }

    #[test]
    fn delete_reconstructs_target_when_disk_is_empty() {
        let temp = tempfile::tempdir().unwrap();
        let resolver = resolver(temp.path(), TvScope::Episode);
        let event = DeleteEvent {
            kind: MediaKind::Tv,
            title: "Show".into(),
            year: Some(2020),
            tmdb: None,
            tvdb: Some(TvdbId(4242)),
            episode: Some(EpisodeNumber::new(2, 3)),
            episode_id: Some(EpisodeId(31)),
            reason: holdarr_model::DeleteReason::FileRemoved,
        };
        let resolved = resolver.resolve_delete(&event).unwrap();
        assert!(
            resolved
                .target_path
                .ends_with("Show (2020) {tvdb-4242}/Season 02/Show - s02e03 (dummy) [ID:31].mp4")
        );
    }
}
