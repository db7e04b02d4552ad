//! # holdarr Server
//!
//! Thin webhook surface over the holdarr core: receives player and
//! content-manager callbacks, parses them into inbound events, and hands
//! them to the lifecycle orchestrator. All real logic lives in
//! `holdarr-core`; this crate is transport, configuration, and wiring.

pub mod parser;
pub mod routes;
pub mod state;

pub use state::AppState;
