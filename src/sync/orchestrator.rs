//! Drives one scope from feed to persisted state.

use std::collections::BTreeSet;
use std::path::PathBuf;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, instrument};

use super::error::SyncError;
use super::request::{SyncReport, SyncRequest};
use crate::download::{Batch, WorkerPool};
use crate::entry::Entry;
use crate::feed::FeedClient;
use crate::plan::{effective_cutoff, plan};
use crate::state::{EntryLedger, ScopeStatus, StateStore};

/// Syncs scopes through a shared feed client and worker pool.
///
/// Several synchronizers may borrow the same pool; each invocation gets its
/// own batch, so their completions never mix.
#[derive(Debug, Clone, Copy)]
pub struct Synchronizer<'a> {
    feed: &'a FeedClient,
    pool: &'a WorkerPool,
}

impl<'a> Synchronizer<'a> {
    /// Creates a synchronizer over an existing client and pool.
    #[must_use]
    pub fn new(feed: &'a FeedClient, pool: &'a WorkerPool) -> Self {
        Self { feed, pool }
    }

    /// Runs one incremental sync of `request.scope` into `request.destination`.
    ///
    /// Steps: load state, compute the cutoff, paginate, plan, download the
    /// planned entries while recording completions, and persist the new state
    /// once every entry has reached a terminal state. The scope's start time is
    /// stamped before pagination, so entries updated during a run are looked at
    /// again by the next one.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError`] on any fatal condition. Entries that fail
    /// verification or transfer are reported in the [`SyncReport`] instead.
    #[instrument(skip(self, request), fields(scope = %request.scope, destination = %request.destination.display()))]
    pub async fn sync_scope(&self, request: &SyncRequest) -> Result<SyncReport, SyncError> {
        request.validate()?;

        tokio::fs::create_dir_all(&request.destination)
            .await
            .map_err(|e| SyncError::destination(&request.destination, e))?;

        let store = StateStore::new(&request.destination);
        let mut state = store.load().await?;
        let previous = state.scope(&request.scope).cloned().unwrap_or_default();
        let cutoff = effective_cutoff(Some(&previous), &request.mode);
        let started_at = Utc::now();

        debug!(
            cutoff = ?cutoff,
            since = %request.mode.feed_since(),
            recorded = previous.entry_timestamps.len(),
            "sync starting"
        );

        let entries = self
            .feed
            .paginate(&request.scope, request.mode.feed_since(), &request.destination)?
            .collect_entries()
            .await?;
        let discovered = entries.len();

        let planned = plan(entries, &previous.entry_timestamps, &request.mode, cutoff);
        let planned_count = planned.len();
        create_entry_directories(&planned).await?;

        let ledger = EntryLedger::from_timestamps(previous.entry_timestamps);
        let (batch, completions) = Batch::new(request.scope.to_string());
        let drain = tokio::spawn(drain_completions(completions, ledger.clone()));

        for entry in planned {
            self.pool.submit(&batch, entry).await?;
        }
        batch.wait_idle().await;

        let stats = batch.stats();
        let report = SyncReport {
            discovered,
            planned: planned_count,
            completed: stats.completed(),
            abandoned: stats.abandoned(),
            failed: stats.failed(),
            retried: stats.retried(),
            bytes_written: stats.bytes_written(),
        };
        drop(batch);
        let recorded = drain.await.map_err(SyncError::Drain)?;

        state.set_scope(
            request.scope.clone(),
            ScopeStatus {
                last_sync_started_at: Some(started_at),
                entry_timestamps: ledger.snapshot(),
            },
        );
        store.save(&state).await?;

        info!(
            discovered = report.discovered,
            planned = report.planned,
            completed = report.completed,
            recorded,
            abandoned = report.abandoned,
            failed = report.failed,
            retried = report.retried,
            bytes = report.bytes_written,
            elapsed_secs = (Utc::now() - started_at).num_seconds(),
            "scope sync complete"
        );
        Ok(report)
    }
}

async fn create_entry_directories(entries: &[Entry]) -> Result<(), SyncError> {
    let directories: BTreeSet<&PathBuf> = entries.iter().map(|e| &e.destination_dir).collect();
    for dir in directories {
        if tokio::fs::try_exists(dir).await.unwrap_or(false) {
            continue;
        }
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| SyncError::destination(dir, e))?;
        debug!(path = %dir.display(), "path created");
    }
    Ok(())
}

/// Folds completed entries into the ledger until every sender is gone.
async fn drain_completions(
    mut completions: mpsc::UnboundedReceiver<Entry>,
    ledger: EntryLedger,
) -> usize {
    let mut recorded = 0;
    while let Some(entry) = completions.recv().await {
        ledger.record_success(&entry.id, entry.updated_at);
        recorded += 1;
        info!(
            title = %entry.title,
            updated = %entry.updated_at,
            took = ?entry.started_at.map(|started| started.elapsed()),
            size = entry.bytes_written,
            uncompressed = entry.uncompressed_size,
            retries = entry.retry_count,
            "entry ready"
        );
    }
    recorded
}
