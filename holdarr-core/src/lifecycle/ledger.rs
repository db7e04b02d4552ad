//! Keyed registry of per-entry lifecycle records.
//!
//! One record exists per entry identity. All transitions for a key serialise
//! on the record's lock (single writer per entity); distinct keys proceed
//! fully in parallel.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use holdarr_model::{EntryKey, LifecycleState};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::monitor::WatchOutcome;
use crate::resolver::ResolvedEntry;

#[derive(Debug)]
pub struct EntryRecord {
    pub key: EntryKey,
    pub state: LifecycleState,
    pub target_path: PathBuf,
    pub title: String,
    /// Terminal outcome of the most recent failed pipeline run.
    pub last_outcome: Option<WatchOutcome>,
    /// Cancels the in-flight monitor task, when one exists.
    pub monitor_cancel: Option<CancellationToken>,
    pub updated_at: DateTime<Utc>,
}

impl EntryRecord {
    fn new(resolved: &ResolvedEntry) -> Self {
        Self {
            key: resolved.key,
            state: LifecycleState::Placeholder,
            target_path: resolved.target_path.clone(),
            title: resolved.title.clone(),
            last_outcome: None,
            monitor_cancel: None,
            updated_at: Utc::now(),
        }
    }

    pub fn set_state(&mut self, next: LifecycleState) {
        if self.state == next {
            return;
        }
        info!(
            target: "lifecycle::state",
            key = %self.key,
            from = self.state.as_str(),
            to = next.as_str(),
            "transition"
        );
        self.state = next;
        self.updated_at = Utc::now();
    }

    /// Cancel and forget the in-flight monitor, if any.
    pub fn cancel_monitor(&mut self) {
        if let Some(token) = self.monitor_cancel.take() {
            token.cancel();
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct EntryLedger {
    entries: Arc<DashMap<EntryKey, Arc<Mutex<EntryRecord>>>>,
}

impl EntryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the record for an entry, creating it in `Placeholder` on first
    /// sight.
    pub fn record(&self, resolved: &ResolvedEntry) -> Arc<Mutex<EntryRecord>> {
        let entry = self
            .entries
            .entry(resolved.key)
            .or_insert_with(|| Arc::new(Mutex::new(EntryRecord::new(resolved))));
        Arc::clone(entry.value())
    }

    pub fn get(&self, key: &EntryKey) -> Option<Arc<Mutex<EntryRecord>>> {
        self.entries.get(key).map(|entry| Arc::clone(entry.value()))
    }

    pub fn remove(&self, key: &EntryKey) {
        self.entries.remove(key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Snapshot of an entry's current state.
    pub async fn state_of(&self, key: &EntryKey) -> Option<LifecycleState> {
        match self.get(key) {
            Some(record) => Some(record.lock().await.state),
            None => None,
        }
    }
}
