//! The dedup token: at most one acquisition pipeline per entry identity.

use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use holdarr_model::EntryKey;
use tracing::trace;
use uuid::Uuid;

/// Keyed compare-and-set registry of in-flight pipelines.
///
/// Claims release themselves on drop, so every exit path out of a pipeline
/// (success, failure, cancellation, panic unwind) frees the key.
#[derive(Debug, Clone, Default)]
pub struct ClaimRegistry {
    inner: Arc<DashMap<EntryKey, Uuid>>,
}

impl ClaimRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically claim `key`. Returns `None` when another pipeline already
    /// holds it.
    pub fn try_claim(&self, key: EntryKey) -> Option<Claim> {
        let owner = Uuid::now_v7();
        match self.inner.entry(key) {
            Entry::Occupied(_) => None,
            Entry::Vacant(vacant) => {
                vacant.insert(owner);
                trace!(target: "lifecycle::claim", %key, %owner, "claimed");
                Some(Claim {
                    registry: Arc::clone(&self.inner),
                    key,
                    owner,
                })
            }
        }
    }

    pub fn is_claimed(&self, key: &EntryKey) -> bool {
        self.inner.contains_key(key)
    }
}

/// Guard for one claimed entry identity; doubles as the acquisition handle
/// correlating the pipeline's monitor task with its entry.
#[derive(Debug)]
pub struct Claim {
    registry: Arc<DashMap<EntryKey, Uuid>>,
    key: EntryKey,
    owner: Uuid,
}

impl Claim {
    pub fn key(&self) -> EntryKey {
        self.key
    }

    /// Correlation id of this pipeline run.
    pub fn id(&self) -> Uuid {
        self.owner
    }
}

impl Drop for Claim {
    fn drop(&mut self) {
        self.registry
            .remove_if(&self.key, |_, owner| *owner == self.owner);
        trace!(target: "lifecycle::claim", key = %self.key, owner = %self.owner, "released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use holdarr_model::{Fidelity, TmdbId};

    fn key() -> EntryKey {
        EntryKey::movie(TmdbId(550), Fidelity::Standard)
    }

    #[test]
    fn second_claim_is_refused_until_release() {
        let registry = ClaimRegistry::new();
        let claim = registry.try_claim(key()).expect("first claim");
        assert!(registry.try_claim(key()).is_none());

        drop(claim);
        assert!(registry.try_claim(key()).is_some());
    }

    #[test]
    fn distinct_keys_claim_independently() {
        let registry = ClaimRegistry::new();
        let _a = registry.try_claim(key()).unwrap();
        let _b = registry
            .try_claim(EntryKey::movie(TmdbId(551), Fidelity::Standard))
            .unwrap();
        assert!(registry.is_claimed(&key()));
    }

    #[test]
    fn drop_releases_even_inside_a_panic() {
        let registry = ClaimRegistry::new();
        let registry_clone = registry.clone();
        let result =
            std::panic::catch_unwind(std::panic::AssertUnwindSafe(move || {
                let _claim = registry_clone.try_claim(key()).unwrap();
                panic!("pipeline blew up");
            }));
        assert!(result.is_err());
        assert!(!registry.is_claimed(&key()));
    }
}
