use std::path::PathBuf;

use thiserror::Error;

/// Configuration faults. These are fatal at startup and never silently
/// downgraded into a different runtime behaviour.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable {0}")]
    MissingVar(&'static str),

    #[error("invalid value for {var}: {reason}")]
    InvalidVar { var: &'static str, reason: String },

    #[error("invalid url in {var}: {reason}")]
    InvalidUrl { var: &'static str, reason: String },

    #[error("path configured in {var} does not exist: {path}")]
    MissingPath { var: &'static str, path: PathBuf },

    #[error("placeholder source file is empty: {0}")]
    EmptyPlaceholderSource(PathBuf),

    #[error(
        "hardlink strategy requires library root {root} on the same volume \
         as the placeholder source {placeholder_source}: {reason}"
    )]
    HardlinkVolume {
        placeholder_source: PathBuf,
        root: PathBuf,
        reason: String,
    },

    #[error("io error during validation: {0}")]
    Io(#[from] std::io::Error),
}
