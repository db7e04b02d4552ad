//! Startup validation. Everything here is fatal: a deployment that fails
//! these checks must not come up, and in particular the hardlink volume
//! precondition is never downgraded to a copy at runtime.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::error::ConfigError;
use crate::models::{Config, PlaceholderStrategy};

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        let source = &self.placeholder.source_file;
        if !source.is_file() {
            return Err(ConfigError::MissingPath {
                var: "DUMMY_FILE_PATH",
                path: source.clone(),
            });
        }
        if fs::metadata(source)?.len() == 0 {
            return Err(ConfigError::EmptyPlaceholderSource(source.clone()));
        }

        for (var, root) in [
            ("MOVIE_LIBRARY_FOLDER", Some(self.libraries.movie_root.as_path())),
            ("TV_LIBRARY_FOLDER", Some(self.libraries.tv_root.as_path())),
            (
                "MOVIE_LIBRARY_4K_FOLDER",
                self.libraries.movie_high_root.as_deref(),
            ),
            ("TV_LIBRARY_4K_FOLDER", self.libraries.tv_high_root.as_deref()),
        ] {
            let Some(root) = root else { continue };
            if !root.is_dir() {
                return Err(ConfigError::MissingPath {
                    var,
                    path: root.to_path_buf(),
                });
            }
            if self.placeholder.strategy == PlaceholderStrategy::Hardlink {
                probe_hardlink(source, root)?;
            }
        }

        if self.monitor.max_poll_attempts == 0 {
            return Err(ConfigError::InvalidVar {
                var: "CHECK_MAX_ATTEMPTS",
                reason: "must be at least 1".into(),
            });
        }
        if self.monitor.poll_interval.is_zero() {
            return Err(ConfigError::InvalidVar {
                var: "CHECK_INTERVAL",
                reason: "must be at least 1 second".into(),
            });
        }

        Ok(())
    }
}

/// Prove the hardlink strategy can work against `root` by linking the source
/// into it once and removing the probe again. Cross-volume roots fail here,
/// at startup, with a configuration error.
fn probe_hardlink(source: &Path, root: &Path) -> Result<(), ConfigError> {
    let probe = root.join(format!(".holdarr-linkprobe-{}", std::process::id()));
    let _ = fs::remove_file(&probe);
    match fs::hard_link(source, &probe) {
        Ok(()) => {
            let _ = fs::remove_file(&probe);
            debug!(target: "config::validate", root = %root.display(), "hardlink probe ok");
            Ok(())
        }
        Err(err) => Err(ConfigError::HardlinkVolume {
            placeholder_source: source.to_path_buf(),
            root: root.to_path_buf(),
            reason: err.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::PathBuf;
    use std::time::Duration;

    use holdarr_model::SectionId;
    use url::Url;

    use crate::error::ConfigError;
    use crate::models::{
        CatalogConfig, Config, LibraryConfig, ManagerEndpoint, ManagerPair,
        MonitorConfig, PlaceholderConfig, PlaceholderStrategy, ServerConfig,
        TvConfig,
    };

    fn endpoint(url: &str) -> ManagerPair {
        ManagerPair {
            standard: ManagerEndpoint {
                base_url: Url::parse(url).unwrap(),
                api_key: "key".into(),
            },
            high: None,
        }
    }

    fn make_config(
        source: PathBuf,
        movie_root: PathBuf,
        tv_root: PathBuf,
        strategy: PlaceholderStrategy,
    ) -> Config {
        Config {
            server: ServerConfig {
                host: "127.0.0.1".into(),
                port: 8011,
            },
            catalog: CatalogConfig {
                base_url: Url::parse("http://plex:32400").unwrap(),
                token: "token".into(),
                movie_section: SectionId(1),
                tv_section: SectionId(2),
            },
            movie_manager: endpoint("http://radarr:7878"),
            tv_manager: endpoint("http://sonarr:8989"),
            libraries: LibraryConfig {
                movie_root,
                tv_root,
                movie_high_root: None,
                tv_high_root: None,
            },
            placeholder: PlaceholderConfig {
                source_file: source,
                strategy,
            },
            monitor: MonitorConfig::default(),
            tv: TvConfig::default(),
        }
    }

    #[test]
    fn accepts_same_volume_hardlink_setup() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("dummy.mp4");
        fs::write(&source, b"stub").unwrap();
        let movies = temp.path().join("movies");
        let tv = temp.path().join("tv");
        fs::create_dir_all(&movies).unwrap();
        fs::create_dir_all(&tv).unwrap();

        let config =
            make_config(source, movies, tv, PlaceholderStrategy::Hardlink);
        config.validate().expect("same-volume hardlink setup is valid");
    }

    #[test]
    fn rejects_missing_source() {
        let temp = tempfile::tempdir().unwrap();
        let movies = temp.path().join("movies");
        fs::create_dir_all(&movies).unwrap();

        let config = make_config(
            temp.path().join("absent.mp4"),
            movies.clone(),
            movies,
            PlaceholderStrategy::Copy,
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingPath { var: "DUMMY_FILE_PATH", .. })
        ));
    }

    #[test]
    fn rejects_empty_source() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("dummy.mp4");
        fs::write(&source, b"").unwrap();
        let movies = temp.path().join("movies");
        fs::create_dir_all(&movies).unwrap();

        let config = make_config(
            source,
            movies.clone(),
            movies,
            PlaceholderStrategy::Copy,
        );
        assert!(matches!(
            config.validate(),
            Err(ConfigError::EmptyPlaceholderSource(_))
        ));
    }

    #[test]
    fn rejects_zero_poll_bounds() {
        let temp = tempfile::tempdir().unwrap();
        let source = temp.path().join("dummy.mp4");
        fs::write(&source, b"stub").unwrap();
        let movies = temp.path().join("movies");
        fs::create_dir_all(&movies).unwrap();

        let mut config = make_config(
            source,
            movies.clone(),
            movies,
            PlaceholderStrategy::Copy,
        );
        config.monitor.max_poll_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidVar { var: "CHECK_MAX_ATTEMPTS", .. })
        ));

        config.monitor.max_poll_attempts = 3;
        config.monitor.poll_interval = Duration::ZERO;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidVar { var: "CHECK_INTERVAL", .. })
        ));
    }

    #[test]
    fn rejects_unknown_strategy_string() {
        assert!(matches!(
            PlaceholderStrategy::parse("symlink", "PLACEHOLDER_STRATEGY"),
            Err(ConfigError::InvalidVar { .. })
        ));
    }
}
