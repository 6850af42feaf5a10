//! Decides which discovered entries must be (re)downloaded.
//!
//! Decision per entry, first match wins:
//!
//! 1. missing-only mode and the file exists: skip
//! 2. the file exists, not forced, and the entry predates the cutoff: skip
//! 3. never recorded: download
//! 4. recorded, and forced / newer than the record / missing on disk: download
//! 5. otherwise: skip

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::entry::Entry;
use crate::state::ScopeStatus;
use crate::timestamp::default_epoch;

/// How a sync invocation treats existing files and recorded state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncMode {
    /// Re-evaluate everything from `from_date` regardless of recorded state.
    pub force: bool,
    /// Only fetch entries absent from the destination.
    pub missing_only: bool,
    /// Epoch used when forcing; defaults to [`default_epoch`].
    pub from_date: Option<DateTime<Utc>>,
}

impl SyncMode {
    /// Returns the lower bound sent as the feed `updated` filter.
    ///
    /// Only a forced sync narrows the feed; otherwise the whole feed is walked
    /// so entries missing on disk stay visible.
    #[must_use]
    pub fn feed_since(&self) -> DateTime<Utc> {
        if self.force {
            self.from_date.unwrap_or_else(default_epoch)
        } else {
            default_epoch()
        }
    }
}

/// Why an entry is downloaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DownloadReason {
    /// No timestamp was ever recorded for the entry.
    NeverSynced,
    /// Force mode.
    Forced,
    /// The feed timestamp is newer than the recorded one.
    Updated,
    /// Recorded as synced but the file is gone.
    MissingOnDisk,
}

/// Why an entry is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Missing-only mode and the file exists.
    AlreadyPresent,
    /// The file exists and the entry predates the cutoff.
    NotStale,
    /// The recorded timestamp is current and the file exists.
    UpToDate,
}

/// Outcome of planning one entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanDecision {
    /// Queue the entry for download.
    Download(DownloadReason),
    /// Leave the entry alone this run.
    Skip(SkipReason),
}

impl PlanDecision {
    /// Returns true for [`PlanDecision::Download`].
    #[must_use]
    pub fn is_download(self) -> bool {
        matches!(self, Self::Download(_))
    }
}

/// Returns the scope's effective cutoff timestamp.
///
/// Forced runs use the caller's `from_date` (or the default epoch); normal runs
/// use the start of the previous run, if there was one.
#[must_use]
pub fn effective_cutoff(status: Option<&ScopeStatus>, mode: &SyncMode) -> Option<DateTime<Utc>> {
    if mode.force {
        Some(mode.from_date.unwrap_or_else(default_epoch))
    } else {
        status.and_then(|status| status.last_sync_started_at)
    }
}

/// Decides a single entry.
#[must_use]
pub fn decide(
    entry: &Entry,
    recorded: Option<DateTime<Utc>>,
    mode: &SyncMode,
    cutoff: Option<DateTime<Utc>>,
) -> PlanDecision {
    if mode.missing_only && entry.exists_on_disk {
        return PlanDecision::Skip(SkipReason::AlreadyPresent);
    }

    if entry.exists_on_disk
        && !mode.force
        && cutoff.is_some_and(|cutoff| entry.updated_at < cutoff)
    {
        return PlanDecision::Skip(SkipReason::NotStale);
    }

    match recorded {
        None => PlanDecision::Download(DownloadReason::NeverSynced),
        Some(_) if mode.force => PlanDecision::Download(DownloadReason::Forced),
        Some(previous) if entry.updated_at > previous => {
            PlanDecision::Download(DownloadReason::Updated)
        }
        Some(_) if !entry.exists_on_disk => PlanDecision::Download(DownloadReason::MissingOnDisk),
        Some(_) => PlanDecision::Skip(SkipReason::UpToDate),
    }
}

/// Filters `entries` down to the ones that must be downloaded.
#[must_use]
pub fn plan(
    entries: Vec<Entry>,
    recorded: &BTreeMap<String, DateTime<Utc>>,
    mode: &SyncMode,
    cutoff: Option<DateTime<Utc>>,
) -> Vec<Entry> {
    let discovered = entries.len();
    let planned: Vec<Entry> = entries
        .into_iter()
        .filter(|entry| {
            let decision = decide(entry, recorded.get(&entry.id).copied(), mode, cutoff);
            debug!(
                id = %entry.id,
                path = %entry.destination_path().display(),
                ?decision,
                "entry planned"
            );
            decision.is_download()
        })
        .collect();

    info!(
        discovered,
        planned = planned.len(),
        force = mode.force,
        missing_only = mode.missing_only,
        "sync plan ready"
    );
    planned
}
