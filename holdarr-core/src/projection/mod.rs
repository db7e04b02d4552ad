//! Filesystem projection of catalog entries.
//!
//! A projected entry is either a stand-in (hard link to, or copy of, one
//! shared source file) or the real media. The swap from stand-in to real is
//! done by renaming a sibling temp file over the target path, so a reader
//! holding the old path open keeps reading the bytes it opened.

use std::path::{Path, PathBuf};

use holdarr_config::{ConfigError, PlaceholderConfig, PlaceholderStrategy};
use tokio::fs;
use tracing::{debug, warn};

use crate::error::{HoldError, Result};

#[derive(Debug, Clone)]
pub struct PlaceholderProjection {
    source: PathBuf,
    strategy: PlaceholderStrategy,
}

impl PlaceholderProjection {
    pub fn new(config: &PlaceholderConfig) -> Self {
        Self {
            source: config.source_file.clone(),
            strategy: config.strategy,
        }
    }

    /// Materialise the stand-in at `target`, replacing whatever is there.
    ///
    /// A hard-link failure is a configuration fault (the strategy requires
    /// source and target on one volume) and is surfaced as such rather than
    /// silently downgraded to a copy.
    pub async fn install_placeholder(&self, target: &Path) -> Result<()> {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        remove_if_present(target).await?;

        match self.strategy {
            PlaceholderStrategy::Hardlink => {
                fs::hard_link(&self.source, target).await.map_err(|err| {
                    HoldError::Config(ConfigError::HardlinkVolume {
                        placeholder_source: self.source.clone(),
                        root: target.to_path_buf(),
                        reason: err.to_string(),
                    })
                })?;
            }
            PlaceholderStrategy::Copy => {
                fs::copy(&self.source, target).await?;
            }
        }
        debug!(
            target: "projection::install",
            path = %target.display(),
            strategy = self.strategy.as_str(),
            "stand-in installed"
        );
        Ok(())
    }

    /// Atomically replace the representation at `target` with the file at
    /// `real`.
    ///
    /// The real file is linked (or copied) to a temporary sibling and then
    /// renamed over `target`; the path never goes through a truncated state.
    /// Fails without touching `target` when `real` is absent or empty.
    pub async fn finalize_real_file(&self, target: &Path, real: &Path) -> Result<()> {
        let meta = fs::metadata(real).await.map_err(|_| {
            HoldError::NotFound(format!("real file not on disk: {}", real.display()))
        })?;
        if meta.len() == 0 {
            return Err(HoldError::NotFound(format!(
                "real file is empty: {}",
                real.display()
            )));
        }

        if real == target {
            // The manager already imported over the target path.
            return Ok(());
        }

        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent).await?;
        }
        let tmp = swap_sibling(target);
        remove_if_present(&tmp).await?;
        if fs::hard_link(real, &tmp).await.is_err() {
            // Real file lives on another volume; fall back to staging a copy.
            // The rename below stays atomic either way.
            if let Err(err) = fs::copy(real, &tmp).await {
                let _ = fs::remove_file(&tmp).await;
                return Err(err.into());
            }
        }
        if let Err(err) = fs::rename(&tmp, target).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(err.into());
        }
        debug!(
            target: "projection::finalize",
            path = %target.display(),
            real = %real.display(),
            "real file swapped into place"
        );
        Ok(())
    }

    /// Delete whichever representation currently occupies `target`.
    pub async fn remove(&self, target: &Path) -> Result<()> {
        remove_if_present(target).await?;
        debug!(target: "projection::remove", path = %target.display(), "representation removed");
        Ok(())
    }

    /// Remove the representation and prune now-empty parent directories up
    /// to (excluding) `root`. Used when an entry leaves the managed catalog;
    /// a directory target (whole-series removal) is deleted recursively.
    pub async fn remove_entry(&self, target: &Path, root: &Path) -> Result<()> {
        match fs::metadata(target).await {
            Ok(meta) if meta.is_dir() => {
                fs::remove_dir_all(target).await?;
                debug!(target: "projection::remove", path = %target.display(), "directory removed");
                return Ok(());
            }
            _ => {}
        }
        self.remove(target).await?;
        let mut dir = target.parent();
        while let Some(current) = dir {
            if !current.starts_with(root) || current == root {
                break;
            }
            match fs::remove_dir(current).await {
                Ok(()) => dir = current.parent(),
                // Not empty (or already gone): stop pruning.
                Err(_) => break,
            }
        }
        Ok(())
    }
}

fn swap_sibling(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("entry");
    target.with_file_name(format!(".{name}.holdarr-swap"))
}

async fn remove_if_present(path: &Path) -> Result<()> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => {
            warn!(target: "projection::remove", path = %path.display(), error = %err, "removal failed");
            Err(err.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn projection(dir: &Path, strategy: PlaceholderStrategy) -> PlaceholderProjection {
        let source = dir.join("dummy.mp4");
        std::fs::write(&source, b"STAND-IN").unwrap();
        PlaceholderProjection::new(&PlaceholderConfig {
            source_file: source,
            strategy,
        })
    }

    #[tokio::test]
    async fn installs_hardlinked_stand_in() {
        let temp = tempfile::tempdir().unwrap();
        let projection = projection(temp.path(), PlaceholderStrategy::Hardlink);
        let target = temp.path().join("movies/Film (1999) {tmdb-550}/Film (1999) (dummy).mp4");

        projection.install_placeholder(&target).await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"STAND-IN");
    }

    #[tokio::test]
    async fn installs_copied_stand_in_and_replaces_existing() {
        let temp = tempfile::tempdir().unwrap();
        let projection = projection(temp.path(), PlaceholderStrategy::Copy);
        let target = temp.path().join("tv/Show {tvdb-7}/Season 01/ep (dummy).mp4");

        projection.install_placeholder(&target).await.unwrap();
        std::fs::write(&target, b"STALE").unwrap();
        projection.install_placeholder(&target).await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"STAND-IN");
    }

    #[tokio::test]
    async fn finalize_swaps_real_file_into_place() {
        let temp = tempfile::tempdir().unwrap();
        let projection = projection(temp.path(), PlaceholderStrategy::Hardlink);
        let target = temp.path().join("movies/Film {tmdb-550}/Film (dummy).mp4");
        projection.install_placeholder(&target).await.unwrap();

        let real = temp.path().join("downloads/Film.1999.mkv");
        std::fs::create_dir_all(real.parent().unwrap()).unwrap();
        std::fs::write(&real, b"REAL MEDIA BYTES").unwrap();

        projection.finalize_real_file(&target, &real).await.unwrap();
        assert_eq!(std::fs::read(&target).unwrap(), b"REAL MEDIA BYTES");
    }

    #[tokio::test]
    async fn finalize_keeps_open_readers_on_old_bytes() {
        let temp = tempfile::tempdir().unwrap();
        let projection = projection(temp.path(), PlaceholderStrategy::Copy);
        let target = temp.path().join("movies/Film {tmdb-1}/Film (dummy).mp4");
        projection.install_placeholder(&target).await.unwrap();

        let real = temp.path().join("Film.mkv");
        std::fs::write(&real, b"REAL MEDIA BYTES").unwrap();

        // A reader that opened the stand-in mid-swap must finish reading the
        // stand-in's bytes, never a truncated or mixed view.
        let mut reader = std::fs::File::open(&target).unwrap();
        projection.finalize_real_file(&target, &real).await.unwrap();

        let mut seen = Vec::new();
        reader.read_to_end(&mut seen).unwrap();
        assert_eq!(seen, b"STAND-IN");
        assert_eq!(std::fs::read(&target).unwrap(), b"REAL MEDIA BYTES");
    }

    #[tokio::test]
    async fn finalize_rejects_missing_or_empty_real_file() {
        let temp = tempfile::tempdir().unwrap();
        let projection = projection(temp.path(), PlaceholderStrategy::Copy);
        let target = temp.path().join("movies/Film {tmdb-2}/Film (dummy).mp4");
        projection.install_placeholder(&target).await.unwrap();

        let missing = temp.path().join("absent.mkv");
        assert!(matches!(
            projection.finalize_real_file(&target, &missing).await,
            Err(HoldError::NotFound(_))
        ));

        let empty = temp.path().join("empty.mkv");
        std::fs::write(&empty, b"").unwrap();
        assert!(matches!(
            projection.finalize_real_file(&target, &empty).await,
            Err(HoldError::NotFound(_))
        ));

        // The stand-in survives both failures.
        assert_eq!(std::fs::read(&target).unwrap(), b"STAND-IN");
    }

    #[tokio::test]
    async fn remove_tolerates_absent_target() {
        let temp = tempfile::tempdir().unwrap();
        let projection = projection(temp.path(), PlaceholderStrategy::Copy);
        projection
            .remove(&temp.path().join("never/created.mp4"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn remove_entry_prunes_empty_folders() {
        let temp = tempfile::tempdir().unwrap();
        let projection = projection(temp.path(), PlaceholderStrategy::Copy);
        let root = temp.path().join("movies");
        let target = root.join("Film (1999) {tmdb-3}/Film (dummy).mp4");
        projection.install_placeholder(&target).await.unwrap();

        projection.remove_entry(&target, &root).await.unwrap();
        assert!(!target.parent().unwrap().exists());
        assert!(root.exists());
    }
}
