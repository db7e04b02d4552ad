use std::sync::Arc;

use holdarr_core::{EntryResolver, LifecycleOrchestrator};

/// Shared handles for the request handlers.
#[derive(Clone, Debug)]
pub struct AppState {
    pub orchestrator: LifecycleOrchestrator,
    pub resolver: Arc<EntryResolver>,
}
