//! Environment-variable loading. The server binary applies `dotenvy` before
//! calling [`Config::from_env`]; this module only reads the process
//! environment.

use std::env;
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

fn require(var: &'static str) -> Result<String, ConfigError> {
    match env::var(var) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ConfigError::MissingVar(var)),
    }
}

fn optional(var: &'static str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}

fn parse_url(var: &'static str, raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim().trim_end_matches('/')).map_err(|err| {
        ConfigError::InvalidUrl {
            var,
            reason: err.to_string(),
        }
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidUrl {
            var,
            reason: format!("unsupported scheme {}", url.scheme()),
        });
    }
    Ok(url)
}

fn parse_number<T: std::str::FromStr>(
    var: &'static str,
    raw: &str,
) -> Result<T, ConfigError> {
    raw.trim().parse::<T>().map_err(|_| ConfigError::InvalidVar {
        var,
        reason: format!("expected a number, got {raw}"),
    })
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Ok(true),
        "0" | "false" | "no" => Ok(false),
        other => Err(ConfigError::InvalidVar {
            var,
            reason: format!("expected a boolean, got {other}"),
        }),
    }
}

fn manager_pair(
    url_var: &'static str,
    key_var: &'static str,
    high_url_var: &'static str,
    high_key_var: &'static str,
) -> Result<ManagerPair, ConfigError> {
    let standard = ManagerEndpoint {
        base_url: parse_url(url_var, &require(url_var)?)?,
        api_key: require(key_var)?,
    };
    let high = match optional(high_url_var) {
        Some(raw) => Some(ManagerEndpoint {
            base_url: parse_url(high_url_var, &raw)?,
            api_key: require(high_key_var)?,
        }),
        None => None,
    };
    Ok(ManagerPair { standard, high })
}

impl Config {
    /// Assemble the configuration from the process environment. Parse errors
    /// are reported per variable; existence and volume checks happen in
    /// [`Config::validate`](crate::validation).
    pub fn from_env() -> Result<Self, ConfigError> {
        let server = ServerConfig {
            host: optional("APP_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: parse_number("APP_PORT", &require("APP_PORT")?)?,
        };

        let catalog = CatalogConfig {
            base_url: parse_url("PLEX_URL", &require("PLEX_URL")?)?,
            token: require("PLEX_TOKEN")?,
            movie_section: SectionId(parse_number(
                "PLEX_MOVIE_SECTION_ID",
                &require("PLEX_MOVIE_SECTION_ID")?,
            )?),
            tv_section: SectionId(parse_number(
                "PLEX_TV_SECTION_ID",
                &require("PLEX_TV_SECTION_ID")?,
            )?),
        };

        let movie_manager = manager_pair(
            "RADARR_URL",
            "RADARR_API_KEY",
            "RADARR_4K_URL",
            "RADARR_4K_API_KEY",
        )?;
        let tv_manager = manager_pair(
            "SONARR_URL",
            "SONARR_API_KEY",
            "SONARR_4K_URL",
            "SONARR_4K_API_KEY",
        )?;

        let libraries = LibraryConfig {
            movie_root: PathBuf::from(require("MOVIE_LIBRARY_FOLDER")?),
            tv_root: PathBuf::from(require("TV_LIBRARY_FOLDER")?),
            movie_high_root: optional("MOVIE_LIBRARY_4K_FOLDER").map(PathBuf::from),
            tv_high_root: optional("TV_LIBRARY_4K_FOLDER").map(PathBuf::from),
        };

        let placeholder = PlaceholderConfig {
            source_file: PathBuf::from(require("DUMMY_FILE_PATH")?),
            strategy: match optional("PLACEHOLDER_STRATEGY") {
                Some(raw) => {
                    PlaceholderStrategy::parse(&raw, "PLACEHOLDER_STRATEGY")?
                }
                None => PlaceholderStrategy::Hardlink,
            },
        };

        let defaults = MonitorConfig::default();
        let monitor = MonitorConfig {
            poll_interval: match optional("CHECK_INTERVAL") {
                Some(raw) => Duration::from_secs(parse_number("CHECK_INTERVAL", &raw)?),
                None => defaults.poll_interval,
            },
            max_poll_attempts: match optional("CHECK_MAX_ATTEMPTS") {
                Some(raw) => parse_number("CHECK_MAX_ATTEMPTS", &raw)?,
                None => defaults.max_poll_attempts,
            },
            max_monitor_time: match optional("MAX_MONITOR_TIME") {
                Some(raw) => {
                    Duration::from_secs(parse_number("MAX_MONITOR_TIME", &raw)?)
                }
                None => defaults.max_monitor_time,
            },
            request_timeout: match optional("UPSTREAM_TIMEOUT") {
                Some(raw) => {
                    Duration::from_secs(parse_number("UPSTREAM_TIMEOUT", &raw)?)
                }
                None => defaults.request_timeout,
            },
        };

        let tv_defaults = TvConfig::default();
        let tv = TvConfig {
            scope: match optional("TV_PLAY_MODE") {
                Some(raw) => {
                    raw.parse().map_err(|err| ConfigError::InvalidVar {
                        var: "TV_PLAY_MODE",
                        reason: format!("{err}"),
                    })?
                }
                None => tv_defaults.scope,
            },
            lookahead: match optional("EPISODES_LOOKAHEAD") {
                Some(raw) => parse_number("EPISODES_LOOKAHEAD", &raw)?,
                None => tv_defaults.lookahead,
            },
            include_specials: match optional("INCLUDE_SPECIALS") {
                Some(raw) => parse_bool("INCLUDE_SPECIALS", &raw)?,
                None => tv_defaults.include_specials,
            },
        };

        Ok(Config {
            server,
            catalog,
            movie_manager,
            tv_manager,
            libraries,
            placeholder,
            monitor,
            tv,
        })
    }
}
