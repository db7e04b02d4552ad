use thiserror::Error;

#[derive(Error, Debug)]
pub enum HoldError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Upstream {endpoint} failed: {detail}")]
    Upstream { endpoint: String, detail: String },

    #[error("Configuration error: {0}")]
    Config(#[from] holdarr_config::ConfigError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Operation cancelled: {0}")]
    Cancelled(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, HoldError>;
