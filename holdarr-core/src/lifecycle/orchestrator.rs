//! The lifecycle orchestrator.
//!
//! Invoked concurrently by independent inbound events. Transitions for one
//! entry serialise on the entry's record lock; the claim registry guarantees
//! at most one acquisition pipeline per entry identity no matter how many
//! play events land at once. Monitors run as their own tasks and never block
//! event intake.

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use holdarr_config::LibraryConfig;
use holdarr_model::{DeleteReason, LifecycleState};
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::acquisition::{AdapterSet, ItemRef};
use crate::catalog::{CatalogNotifier, RefreshScope};
use crate::error::{HoldError, Result};
use crate::monitor::{MonitorSettings, TransferMonitor, WatchOutcome};
use crate::projection::PlaceholderProjection;
use crate::resolver::ResolvedEntry;

use super::claim::{Claim, ClaimRegistry};
use super::ledger::{EntryLedger, EntryRecord};

#[derive(Clone)]
pub struct LifecycleOrchestrator {
    ledger: EntryLedger,
    claims: ClaimRegistry,
    adapters: AdapterSet,
    projection: Arc<PlaceholderProjection>,
    notifier: Arc<dyn CatalogNotifier>,
    monitor: TransferMonitor,
    libraries: LibraryConfig,
}

impl std::fmt::Debug for LifecycleOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleOrchestrator")
            .field("entries", &self.ledger.len())
            .finish()
    }
}

impl LifecycleOrchestrator {
    pub fn new(
        adapters: AdapterSet,
        projection: PlaceholderProjection,
        notifier: Arc<dyn CatalogNotifier>,
        libraries: LibraryConfig,
        monitor: MonitorSettings,
    ) -> Self {
        Self {
            ledger: EntryLedger::new(),
            claims: ClaimRegistry::new(),
            adapters,
            projection: Arc::new(projection),
            notifier,
            monitor: TransferMonitor::new(monitor),
            libraries,
        }
    }

    pub fn ledger(&self) -> &EntryLedger {
        &self.ledger
    }

    pub fn claims(&self) -> &ClaimRegistry {
        &self.claims
    }

    /// A user pressed play on a stand-in: start an acquisition pipeline
    /// unless one is already running or the entry is already available.
    pub async fn handle_play(&self, resolved: &ResolvedEntry) -> Result<()> {
        let record = self.ledger.record(resolved);
        let claim = {
            let mut rec = record.lock().await;
            match rec.state {
                LifecycleState::Available => {
                    debug!(target: "lifecycle::play", key = %rec.key, "already available");
                    return Ok(());
                }
                state if state.is_in_flight() => {
                    debug!(target: "lifecycle::play", key = %rec.key, %state, "pipeline already running");
                    return Ok(());
                }
                _ => {}
            }
            let Some(claim) = self.claims.try_claim(rec.key) else {
                debug!(target: "lifecycle::play", key = %rec.key, "claim held elsewhere");
                return Ok(());
            };
            rec.set_state(LifecycleState::Triggering);
            claim
        };

        info!(
            target: "lifecycle::play",
            key = %resolved.key,
            pipeline = %claim.id(),
            title = %resolved.title,
            "triggering acquisition"
        );
        let client = self
            .adapters
            .client_for(resolved.item.kind, resolved.item.fidelity);
        if let Err(err) = client.trigger_search(&resolved.item).await {
            let mut rec = record.lock().await;
            if rec.state == LifecycleState::Triggering {
                rec.set_state(LifecycleState::Placeholder);
            }
            warn!(
                target: "lifecycle::play",
                key = %rec.key,
                error = %err,
                "trigger failed, entry stays playable"
            );
            drop(rec);
            drop(claim);
            return Err(err);
        }

        let cancel = CancellationToken::new();
        {
            let mut rec = record.lock().await;
            if rec.state != LifecycleState::Triggering {
                // An import or delete raced the trigger; whoever won owns
                // the entry now.
                debug!(target: "lifecycle::play", key = %rec.key, "state changed during trigger");
                return Ok(());
            }
            rec.set_state(LifecycleState::Monitoring);
            rec.monitor_cancel = Some(cancel.clone());
        }
        self.spawn_monitor(Arc::clone(&record), resolved.item.clone(), claim, cancel);
        Ok(())
    }

    /// A real file landed upstream. Finalize regardless of current state;
    /// repeated imports for an already-available entry are no-ops.
    pub async fn handle_import(
        &self,
        resolved: &ResolvedEntry,
        real_path: Option<PathBuf>,
    ) -> Result<()> {
        let record = self.ledger.record(resolved);
        self.finalize_record(&record, real_path).await
    }

    /// The upstream manager reports the backing file (or the whole entry)
    /// gone. Any in-flight pipeline is cancelled.
    pub async fn handle_delete(
        &self,
        resolved: &ResolvedEntry,
        reason: DeleteReason,
    ) -> Result<()> {
        let record = self.ledger.record(resolved);
        let scope = RefreshScope {
            kind: resolved.key.kind(),
            fidelity: resolved.key.fidelity(),
        };
        match reason {
            DeleteReason::FileRemoved => {
                let mut rec = record.lock().await;
                rec.cancel_monitor();
                self.projection.install_placeholder(&rec.target_path).await?;
                rec.set_state(LifecycleState::Placeholder);
                rec.last_outcome = None;
                info!(target: "lifecycle::delete", key = %rec.key, "stand-in reinstalled");
            }
            DeleteReason::EntryRemoved => {
                {
                    let mut rec = record.lock().await;
                    rec.cancel_monitor();
                    let root = self
                        .libraries
                        .root_for(rec.key.kind(), rec.key.fidelity())
                        .to_path_buf();
                    self.projection.remove_entry(&rec.target_path, &root).await?;
                    info!(target: "lifecycle::delete", key = %rec.key, "entry removed from catalog");
                }
                self.ledger.remove(&resolved.key);
            }
        }
        self.notify(scope);
        Ok(())
    }

    /// Pre-seeding: install stand-ins for entries newly imported upstream.
    ///
    /// Group-scoped television entries share one ledger record; the stand-in
    /// still goes to each unit's own path.
    pub async fn handle_add(&self, entries: &[ResolvedEntry]) -> Result<()> {
        let mut scopes = HashSet::new();
        for resolved in entries {
            let record = self.ledger.record(resolved);
            let rec = record.lock().await;
            if rec.state != LifecycleState::Placeholder {
                continue;
            }
            self.projection
                .install_placeholder(&resolved.target_path)
                .await?;
            info!(
                target: "lifecycle::seed",
                key = %rec.key,
                path = %resolved.target_path.display(),
                "stand-in seeded"
            );
            scopes.insert(RefreshScope {
                kind: rec.key.kind(),
                fidelity: rec.key.fidelity(),
            });
        }
        for scope in scopes {
            self.notify(scope);
        }
        Ok(())
    }

    /// Idempotent finalize shared by import events and monitor completions;
    /// whichever signal arrives first wins and the second is discarded.
    async fn finalize_record(
        &self,
        record: &Arc<Mutex<EntryRecord>>,
        real_path: Option<PathBuf>,
    ) -> Result<()> {
        let scope;
        {
            let mut rec = record.lock().await;
            if rec.state == LifecycleState::Available {
                debug!(target: "lifecycle::finalize", key = %rec.key, "already finalized");
                return Ok(());
            }
            let real = real_path.ok_or_else(|| {
                HoldError::NotFound("import signal carried no file path".into())
            })?;
            rec.set_state(LifecycleState::Finalizing);
            if let Err(err) =
                self.projection.finalize_real_file(&rec.target_path, &real).await
            {
                // Stay in Finalizing: the next import or monitor-completed
                // signal retries. The entry is never marked available
                // without a verified file.
                warn!(
                    target: "lifecycle::finalize",
                    key = %rec.key,
                    error = %err,
                    "swap failed"
                );
                return Err(err);
            }
            rec.set_state(LifecycleState::Available);
            rec.last_outcome = None;
            rec.cancel_monitor();
            info!(
                target: "lifecycle::finalize",
                key = %rec.key,
                path = %rec.target_path.display(),
                "entry available"
            );
            scope = RefreshScope {
                kind: rec.key.kind(),
                fidelity: rec.key.fidelity(),
            };
        }
        self.notify(scope);
        Ok(())
    }

    fn spawn_monitor(
        &self,
        record: Arc<Mutex<EntryRecord>>,
        item: ItemRef,
        claim: Claim,
        cancel: CancellationToken,
    ) {
        let this = self.clone();
        tokio::spawn(async move {
            let client = this.adapters.client_for(item.kind, item.fidelity);
            let pipeline = claim.id();
            let outcome = this.monitor.watch(client, &item, &cancel).await;
            match outcome {
                Some(WatchOutcome::Completed { real_path }) => {
                    if let Err(err) =
                        this.finalize_record(&record, Some(real_path)).await
                    {
                        warn!(
                            target: "lifecycle::monitor",
                            %pipeline,
                            error = %err,
                            "finalize after completed transfer failed"
                        );
                    }
                }
                Some(outcome) => {
                    let mut rec = record.lock().await;
                    if rec.state == LifecycleState::Monitoring {
                        rec.set_state(LifecycleState::Failed);
                        rec.last_outcome = Some(outcome);
                        rec.monitor_cancel = None;
                        // Failed is terminal for this run only; the entry
                        // reverts to a playable stand-in.
                        rec.set_state(LifecycleState::Placeholder);
                    }
                }
                None => {
                    // Cancelled: the canceller owns the entry's state.
                }
            }
            drop(claim);
        });
    }

    fn notify(&self, scope: RefreshScope) {
        let notifier = Arc::clone(&self.notifier);
        tokio::spawn(async move {
            notifier.refresh(scope).await;
        });
    }
}
