//! Jobs, batches and the per-entry download state machine.
//!
//! ```text
//! Pending ──> Downloading ──> Verifying ──> Done
//!                 │   ^           │
//!                 │   └─ Retrying <┤
//!                 v        │      └──────> Abandoned
//!               Failed     └─────────────> Abandoned (pool closed)
//! ```
//!
//! `Done`, `Abandoned` and `Failed` are terminal. Only a terminal job releases
//! its [`WorkUnit`].

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use tokio::sync::mpsc;
use tracing::warn;

use super::tracker::{WorkTracker, WorkUnit};
use crate::entry::Entry;

/// Lifecycle state of one queued entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    /// Admitted, waiting for a worker.
    Pending,
    /// Streaming the resource to disk.
    Downloading,
    /// Checking the completed file.
    Verifying,
    /// Failed verification, queued for another attempt.
    Retrying,
    /// Downloaded and verified.
    Done,
    /// Failed verification too many times; left for the next run.
    Abandoned,
    /// Transport or filesystem failure; dropped for this run.
    Failed,
}

impl JobState {
    /// Returns true for states that release the job's work unit.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Abandoned | Self::Failed)
    }

    /// Returns true when `next` is a legal successor of `self`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending | Self::Retrying, Self::Downloading)
                | (Self::Downloading, Self::Verifying | Self::Failed)
                | (Self::Verifying, Self::Done | Self::Retrying | Self::Abandoned)
                | (Self::Retrying, Self::Abandoned)
        )
    }
}

/// Returns the state that follows a failed verification.
#[must_use]
pub fn after_integrity_failure(retry_count: u32, max_retries: u32) -> JobState {
    if retry_count < max_retries {
        JobState::Retrying
    } else {
        JobState::Abandoned
    }
}

/// Counters for one batch. Updated concurrently by workers.
#[derive(Debug, Default)]
pub struct BatchStats {
    completed: AtomicUsize,
    abandoned: AtomicUsize,
    failed: AtomicUsize,
    retried: AtomicUsize,
    bytes_written: AtomicU64,
}

impl BatchStats {
    /// Entries downloaded and verified.
    #[must_use]
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    /// Entries that exhausted their integrity retries.
    #[must_use]
    pub fn abandoned(&self) -> usize {
        self.abandoned.load(Ordering::SeqCst)
    }

    /// Entries dropped after a transport or filesystem error.
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failed.load(Ordering::SeqCst)
    }

    /// Integrity-triggered re-attempts.
    #[must_use]
    pub fn retried(&self) -> usize {
        self.retried.load(Ordering::SeqCst)
    }

    /// Bytes written by verified downloads.
    #[must_use]
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written.load(Ordering::SeqCst)
    }

    pub(super) fn record_completed(&self, bytes: u64) {
        self.completed.fetch_add(1, Ordering::SeqCst);
        self.bytes_written.fetch_add(bytes, Ordering::SeqCst);
    }

    pub(super) fn record_abandoned(&self) {
        self.abandoned.fetch_add(1, Ordering::SeqCst);
    }

    pub(super) fn record_failed(&self) {
        self.failed.fetch_add(1, Ordering::SeqCst);
    }

    pub(super) fn record_retried(&self) {
        self.retried.fetch_add(1, Ordering::SeqCst);
    }
}

/// Groups the jobs of one sync invocation on the shared pool.
///
/// Holds the invocation's work tracker, completion channel and statistics.
/// The completion receiver closes once the caller's handle and every job of
/// the batch have been dropped.
#[derive(Debug)]
pub struct Batch {
    label: String,
    tracker: WorkTracker,
    completions: mpsc::UnboundedSender<Entry>,
    stats: BatchStats,
}

impl Batch {
    /// Creates a batch and the receiver its completed entries are published on.
    #[must_use]
    pub fn new(label: impl Into<String>) -> (Arc<Self>, mpsc::UnboundedReceiver<Entry>) {
        let (completions, receiver) = mpsc::unbounded_channel();
        let batch = Self {
            label: label.into(),
            tracker: WorkTracker::new(),
            completions,
            stats: BatchStats::default(),
        };
        (Arc::new(batch), receiver)
    }

    /// Returns the batch label used in logs.
    #[must_use]
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns the batch statistics.
    #[must_use]
    pub fn stats(&self) -> &BatchStats {
        &self.stats
    }

    /// Returns the number of jobs not yet terminal.
    #[must_use]
    pub fn outstanding(&self) -> usize {
        self.tracker.outstanding()
    }

    /// Resolves once every job admitted to this batch is terminal.
    pub async fn wait_idle(&self) {
        self.tracker.wait_idle().await;
    }

    pub(super) fn admit(self: &Arc<Self>, entry: Entry) -> Job {
        Job {
            unit: self.tracker.admit(),
            batch: Arc::clone(self),
            entry,
            state: JobState::Pending,
        }
    }

    pub(super) fn publish(&self, entry: Entry) {
        if self.completions.send(entry).is_err() {
            warn!(batch = %self.label, "completion receiver dropped");
        }
    }
}

/// One entry travelling through the pool.
#[derive(Debug)]
pub struct Job {
    pub(super) entry: Entry,
    pub(super) batch: Arc<Batch>,
    pub(super) state: JobState,
    unit: WorkUnit,
}

impl Job {
    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> JobState {
        self.state
    }

    pub(super) fn advance(&mut self, next: JobState) {
        if !self.state.can_transition_to(next) {
            warn!(
                from = ?self.state,
                to = ?next,
                path = %self.entry.destination_path().display(),
                "unexpected job state transition"
            );
        }
        self.state = next;
    }

    /// Publishes the entry as completed, then releases the work unit.
    pub(super) fn complete(self) {
        let Self {
            entry, batch, unit, ..
        } = self;
        batch.stats.record_completed(entry.bytes_written);
        batch.publish(entry);
        drop(batch);
        drop(unit);
    }
}
