use serde::{Deserialize, Serialize};

/// Lifecycle state of one catalog entry.
///
/// Transitions run `Placeholder → Triggering → Monitoring → Finalizing →
/// Available`, with `Failed` reached on monitor exhaustion and reverts to
/// `Placeholder` on failure or upstream delete. `Available` and `Failed` end
/// a single pipeline run; the entry itself is never permanently terminal.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize,
)]
pub enum LifecycleState {
    /// Stand-in present, no acquisition in flight.
    #[default]
    Placeholder,
    /// Acquisition request sent, not yet confirmed by the adapter.
    Triggering,
    /// Adapter confirmed an active transfer; polling underway.
    Monitoring,
    /// Transfer reported complete; swap in progress.
    Finalizing,
    /// Real file in place.
    Available,
    /// Acquisition exhausted or errored; reverts to a playable stand-in.
    Failed,
}

impl LifecycleState {
    /// States from which a play event may start a new acquisition pipeline.
    pub fn can_trigger(&self) -> bool {
        matches!(self, LifecycleState::Placeholder | LifecycleState::Failed)
    }

    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            LifecycleState::Triggering
                | LifecycleState::Monitoring
                | LifecycleState::Finalizing
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LifecycleState::Placeholder => "placeholder",
            LifecycleState::Triggering => "triggering",
            LifecycleState::Monitoring => "monitoring",
            LifecycleState::Finalizing => "finalizing",
            LifecycleState::Available => "available",
            LifecycleState::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
