//! Synchronized record of entries synced during a run.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};

/// Owned, lock-guarded map from entry id to the feed timestamp that was
/// successfully downloaded and verified.
///
/// Clones share the same map. Only [`record_success`](Self::record_success)
/// mutates it.
#[derive(Debug, Clone, Default)]
pub struct EntryLedger {
    inner: Arc<Mutex<BTreeMap<String, DateTime<Utc>>>>,
}

impl EntryLedger {
    /// Creates a ledger seeded with previously recorded timestamps.
    #[must_use]
    pub fn from_timestamps(timestamps: BTreeMap<String, DateTime<Utc>>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(timestamps)),
        }
    }

    /// Records that `id` was synced at feed timestamp `updated_at`.
    pub fn record_success(&self, id: &str, updated_at: DateTime<Utc>) {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.to_string(), updated_at);
    }

    /// Returns a copy of the current map.
    #[must_use]
    pub fn snapshot(&self) -> BTreeMap<String, DateTime<Utc>> {
        self.inner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}
