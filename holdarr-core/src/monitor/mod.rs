//! Transfer monitoring.
//!
//! One monitor watch runs per in-flight acquisition handle, as its own
//! suspension-capable task. The loop is bounded by a maximum attempt count
//! and a maximum wall-clock duration (whichever is reached first) and
//! observes its cancellation token at every tick.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use holdarr_config::MonitorConfig;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use crate::acquisition::{AcquisitionClient, ItemRef, TransferStatus};

/// Terminal outcome of a completed watch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WatchOutcome {
    /// The manager reports the transfer done and the real file is verified
    /// present and non-empty on disk.
    Completed { real_path: PathBuf },
    /// Attempt or wall-clock limits exhausted with the transfer still active
    /// or indeterminate.
    TimedOut,
    /// The transfer was removed or errored upstream before completing.
    Vanished,
}

#[derive(Debug, Clone)]
pub struct MonitorSettings {
    pub poll_interval: Duration,
    pub max_attempts: u32,
    pub max_duration: Duration,
}

impl From<&MonitorConfig> for MonitorSettings {
    fn from(config: &MonitorConfig) -> Self {
        Self {
            poll_interval: config.poll_interval,
            max_attempts: config.max_poll_attempts,
            max_duration: config.max_monitor_time,
        }
    }
}

#[derive(Debug, Clone)]
pub struct TransferMonitor {
    settings: MonitorSettings,
}

impl TransferMonitor {
    pub fn new(settings: MonitorSettings) -> Self {
        Self { settings }
    }

    /// Poll the adapter until a terminal outcome or cancellation.
    ///
    /// Returns `None` when cancelled before reaching an outcome; the caller
    /// mutates no state in that case. A completion report without a file
    /// path is indeterminate (it cannot be verified, and the stand-in must
    /// never be mistaken for the real file), so polling continues until the
    /// path shows up or limits run out.
    pub async fn watch(
        &self,
        client: Arc<dyn AcquisitionClient>,
        item: &ItemRef,
        cancel: &CancellationToken,
    ) -> Option<WatchOutcome> {
        let deadline = Instant::now() + self.settings.max_duration;
        let mut attempts = 0u32;
        let mut saw_active = false;

        loop {
            if cancel.is_cancelled() {
                debug!(target: "monitor::watch", title = %item.title, "cancelled");
                return None;
            }

            match client.transfer_status(item).await {
                Ok(TransferStatus::Completed { path: Some(candidate) }) => {
                    // The manager can clear its queue slightly before the
                    // file write is flushed; only a verified file counts.
                    if file_ready(&candidate).await {
                        debug!(
                            target: "monitor::watch",
                            title = %item.title,
                            path = %candidate.display(),
                            "transfer complete, file verified"
                        );
                        return Some(WatchOutcome::Completed {
                            real_path: candidate,
                        });
                    }
                    trace!(
                        target: "monitor::watch",
                        title = %item.title,
                        path = %candidate.display(),
                        "reported complete but file not ready yet"
                    );
                }
                Ok(TransferStatus::Completed { path: None }) => {
                    trace!(
                        target: "monitor::watch",
                        title = %item.title,
                        "reported complete without a file path"
                    );
                }
                Ok(TransferStatus::Active { progress }) => {
                    saw_active = true;
                    trace!(
                        target: "monitor::watch",
                        title = %item.title,
                        ?progress,
                        "transfer active"
                    );
                }
                Ok(TransferStatus::Pending) => {
                    if saw_active {
                        // The queue entry disappeared without producing a
                        // file.
                        debug!(target: "monitor::watch", title = %item.title, "transfer vanished from queue");
                        return Some(WatchOutcome::Vanished);
                    }
                    trace!(target: "monitor::watch", title = %item.title, "nothing queued yet");
                }
                Ok(TransferStatus::Vanished) => {
                    debug!(target: "monitor::watch", title = %item.title, "transfer reported vanished");
                    return Some(WatchOutcome::Vanished);
                }
                Err(err) => {
                    warn!(
                        target: "monitor::watch",
                        title = %item.title,
                        error = %err,
                        "status poll failed"
                    );
                }
            }

            attempts += 1;
            if attempts >= self.settings.max_attempts || Instant::now() >= deadline {
                debug!(
                    target: "monitor::watch",
                    title = %item.title,
                    attempts,
                    "monitor limits exhausted"
                );
                return Some(WatchOutcome::TimedOut);
            }

            tokio::select! {
                _ = cancel.cancelled() => {
                    debug!(target: "monitor::watch", title = %item.title, "cancelled");
                    return None;
                }
                _ = tokio::time::sleep(self.settings.poll_interval) => {}
            }
        }
    }
}

async fn file_ready(path: &Path) -> bool {
    match tokio::fs::metadata(path).await {
        Ok(meta) => meta.is_file() && meta.len() > 0,
        Err(_) => false,
    }
}
