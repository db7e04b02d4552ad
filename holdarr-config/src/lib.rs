//! Shared configuration library for holdarr.
//!
//! Centralizes environment-backed config loading and validation so the
//! server binary and the core agree on defaults, managed variables, and
//! validation rules. Configuration faults carry their own error type so they
//! stay distinguishable from runtime failures: a bad deployment should fail
//! loudly at startup, not degrade behaviour at first use.

pub mod error;
pub mod loader;
pub mod models;
pub mod validation;

pub use error::ConfigError;
pub use models::{
    CatalogConfig, Config, LibraryConfig, ManagerEndpoint, ManagerPair,
    MonitorConfig, PlaceholderConfig, PlaceholderStrategy, ServerConfig,
    TvConfig,
};
