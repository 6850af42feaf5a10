//! Sync invocation parameters and the per-run report.

use std::path::PathBuf;

use chrono::{DateTime, Utc};

use super::error::SyncError;
use crate::plan::SyncMode;
use crate::scope::ScopeKey;
use crate::timestamp::parse_timestamp;

/// One scope to sync into one destination root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    /// Product, version and format to sync.
    pub scope: ScopeKey,
    /// Destination root; created if absent.
    pub destination: PathBuf,
    /// Force / missing-only options.
    pub mode: SyncMode,
}

impl SyncRequest {
    /// Creates a request with the default (incremental) mode.
    #[must_use]
    pub fn new(scope: ScopeKey, destination: impl Into<PathBuf>) -> Self {
        Self {
            scope,
            destination: destination.into(),
            mode: SyncMode::default(),
        }
    }

    /// Replaces the sync mode.
    #[must_use]
    pub fn with_mode(mut self, mode: SyncMode) -> Self {
        self.mode = mode;
        self
    }

    /// Checks the preconditions that must hold before any I/O.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::MissingField`] for a blank scope component.
    pub fn validate(&self) -> Result<(), SyncError> {
        match self.scope.first_missing_field() {
            Some(field) => Err(SyncError::MissingField { field }),
            None => Ok(()),
        }
    }
}

/// Parses the user-supplied `from_date` option.
///
/// # Errors
///
/// Returns [`SyncError::InvalidFromDate`] when `raw` is not an ISO-8601 date
/// or timestamp.
pub fn parse_from_date(raw: &str) -> Result<DateTime<Utc>, SyncError> {
    parse_timestamp(raw).ok_or_else(|| SyncError::InvalidFromDate {
        value: raw.to_string(),
    })
}

/// Outcome counters of one scope sync.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Entries produced by the feed.
    pub discovered: usize,
    /// Entries the planner queued.
    pub planned: usize,
    /// Entries downloaded, verified and recorded.
    pub completed: usize,
    /// Entries that exhausted their integrity retries.
    pub abandoned: usize,
    /// Entries dropped after a transport or filesystem error.
    pub failed: usize,
    /// Integrity-triggered re-attempts.
    pub retried: usize,
    /// Bytes written by verified downloads.
    pub bytes_written: u64,
}

impl SyncReport {
    /// Returns true when every planned entry was synced.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed == self.planned
    }
}
