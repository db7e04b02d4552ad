//! Per-entry lifecycle: dedup claims, the entry ledger, and the
//! orchestrator that drives acquisitions.

pub mod claim;
pub mod ledger;
pub mod orchestrator;

pub use claim::{Claim, ClaimRegistry};
pub use ledger::{EntryLedger, EntryRecord};
pub use orchestrator::LifecycleOrchestrator;
