//! Core library for the holdarr placeholder orchestrator.
//!
//! Keeps a front-end media catalog fully populated with lightweight stand-in
//! files and transparently swaps in the real media once a user plays an
//! entry. The pieces, leaf first:
//!
//! - [`projection`] creates and removes stand-in representations and performs
//!   the atomic stand-in → real-file swap.
//! - [`acquisition`] abstracts the upstream content managers (movie and TV,
//!   each with an optional high-fidelity instance).
//! - [`resolver`] maps inbound catalog/manager events onto canonical entry
//!   identities at the configured television scope.
//! - [`lifecycle`] owns the per-entry state machine, deduplicates concurrent
//!   triggers, and drives acquisitions to completion.
//! - [`monitor`] polls an in-flight transfer with bounded attempts and wall
//!   clock, reporting a terminal outcome.
//! - [`catalog`] tells the front-end catalog to refresh after a swap.

pub mod acquisition;
pub mod catalog;
pub mod error;
pub mod lifecycle;
pub mod monitor;
pub mod projection;
pub mod resolver;

pub use acquisition::{AcquisitionClient, AdapterSet, ItemRef, TransferStatus};
pub use catalog::{CatalogNotifier, PlexNotifier, RefreshScope};
pub use error::{HoldError, Result};
pub use lifecycle::{ClaimRegistry, EntryLedger, LifecycleOrchestrator};
pub use monitor::{MonitorSettings, TransferMonitor, WatchOutcome};
pub use projection::PlaceholderProjection;
pub use resolver::{EntryResolver, ResolvedEntry};
