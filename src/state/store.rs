//! Durable sync state under the destination root.
//!
//! The whole state is rewritten once per run through a temporary file and a
//! rename, so a crash mid-run leaves the previous state intact.

use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument};

use super::error::StateError;
use crate::scope::ScopeKey;

/// Fixed state file name under the destination root.
pub const STATE_FILE_NAME: &str = "sync-state.json";

/// Current on-disk format version.
pub const STATE_FORMAT_VERSION: u32 = 1;

/// Per-scope sync record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScopeStatus {
    /// Start time of the run that produced this record.
    pub last_sync_started_at: Option<DateTime<Utc>>,
    /// Entry id to the feed timestamp that was successfully synced.
    pub entry_timestamps: BTreeMap<String, DateTime<Utc>>,
}

/// All persisted scopes of one destination root.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncState {
    scopes: HashMap<ScopeKey, ScopeStatus>,
}

impl SyncState {
    /// Creates an empty state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the record for `key`, if the scope was ever synced.
    #[must_use]
    pub fn scope(&self, key: &ScopeKey) -> Option<&ScopeStatus> {
        self.scopes.get(key)
    }

    /// Replaces the record for `key`.
    pub fn set_scope(&mut self, key: ScopeKey, status: ScopeStatus) {
        self.scopes.insert(key, status);
    }

    /// Returns the number of recorded scopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.len()
    }

    /// Returns true when no scope has been recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.is_empty()
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    version: u32,
    scopes: Vec<ScopeRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct ScopeRecord {
    #[serde(flatten)]
    key: ScopeKey,
    last_sync_started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: BTreeMap<String, DateTime<Utc>>,
}

impl From<&SyncState> for StateFile {
    fn from(state: &SyncState) -> Self {
        let mut scopes: Vec<ScopeRecord> = state
            .scopes
            .iter()
            .map(|(key, status)| ScopeRecord {
                key: key.clone(),
                last_sync_started_at: status.last_sync_started_at,
                entries: status.entry_timestamps.clone(),
            })
            .collect();
        scopes.sort_by(|a, b| a.key.cmp(&b.key));
        Self {
            version: STATE_FORMAT_VERSION,
            scopes,
        }
    }
}

impl From<StateFile> for SyncState {
    fn from(file: StateFile) -> Self {
        let scopes = file
            .scopes
            .into_iter()
            .map(|record| {
                (
                    record.key,
                    ScopeStatus {
                        last_sync_started_at: record.last_sync_started_at,
                        entry_timestamps: record.entries,
                    },
                )
            })
            .collect();
        Self { scopes }
    }
}

/// Loads and saves [`SyncState`] for one destination root.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    /// Creates a store for the state file under `root`.
    #[must_use]
    pub fn new(root: &Path) -> Self {
        Self {
            path: root.join(STATE_FILE_NAME),
        }
    }

    /// Returns the state file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads the state file.
    ///
    /// A missing file is an empty state. A file that exists but cannot be
    /// decoded is an error, never silently treated as empty.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the file cannot be read or decoded.
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    pub async fn load(&self) -> Result<SyncState, StateError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("no state file, starting empty");
                return Ok(SyncState::new());
            }
            Err(e) => return Err(StateError::io(&self.path, e)),
        };

        let file: StateFile =
            serde_json::from_slice(&bytes).map_err(|source| StateError::Corrupt {
                path: self.path.clone(),
                source,
            })?;
        if file.version != STATE_FORMAT_VERSION {
            return Err(StateError::UnsupportedVersion {
                path: self.path.clone(),
                version: file.version,
            });
        }

        let state = SyncState::from(file);
        debug!(scopes = state.len(), "state loaded");
        Ok(state)
    }

    /// Replaces the state file with `state`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when encoding, writing, syncing or renaming fails.
    #[instrument(level = "debug", skip(self, state), fields(path = %self.path.display()))]
    pub async fn save(&self, state: &SyncState) -> Result<(), StateError> {
        let bytes =
            serde_json::to_vec_pretty(&StateFile::from(state)).map_err(StateError::Encode)?;
        let tmp_path = self.path.with_extension("json.tmp");

        let mut file = tokio::fs::File::create(&tmp_path)
            .await
            .map_err(|e| StateError::io(&tmp_path, e))?;
        file.write_all(&bytes)
            .await
            .map_err(|e| StateError::io(&tmp_path, e))?;
        file.sync_all()
            .await
            .map_err(|e| StateError::io(&tmp_path, e))?;
        drop(file);

        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| StateError::io(&self.path, e))?;

        info!(scopes = state.len(), bytes = bytes.len(), "sync state saved");
        Ok(())
    }
}
