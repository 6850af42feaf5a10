//! Long-lived worker pool shared by every sync invocation of a process.
//!
//! Workers pull jobs from one bounded queue. A job whose archive fails
//! verification is pushed back onto the same queue with its work unit still
//! attached; transport and filesystem failures drop the job for this run.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use thiserror::Error;
use tokio::sync::{Mutex, mpsc};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

use super::client::HttpClient;
use super::constants::{DEFAULT_MAX_RETRIES, DEFAULT_QUEUE_CAPACITY, DEFAULT_WORKERS, MAX_WORKERS};
use super::job::{Batch, Job, JobState, after_integrity_failure};
use crate::entry::Entry;
use crate::verify::verify_archive_blocking;

/// Minimum number of download workers.
pub const MIN_WORKERS: usize = 1;

/// Errors from starting or feeding the pool.
#[derive(Debug, Error)]
pub enum PoolError {
    /// Worker count outside the supported range.
    #[error("invalid worker count {value}: must be between {MIN_WORKERS} and {MAX_WORKERS}")]
    InvalidWorkers {
        /// The rejected value.
        value: usize,
    },

    /// A zero-capacity queue cannot hold any job.
    #[error("queue capacity must be at least 1")]
    InvalidQueueCapacity,

    /// The queue no longer accepts jobs.
    #[error("worker pool is closed")]
    Closed,
}

/// Pool sizing and retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    /// Number of concurrent download workers.
    pub workers: usize,
    /// Bounded job queue capacity.
    pub queue_capacity: usize,
    /// Re-attempts after an integrity failure.
    pub max_retries: u32,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl PoolConfig {
    /// Checks the configured bounds.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidWorkers`] or [`PoolError::InvalidQueueCapacity`].
    pub fn validate(&self) -> Result<(), PoolError> {
        if !(MIN_WORKERS..=MAX_WORKERS).contains(&self.workers) {
            return Err(PoolError::InvalidWorkers {
                value: self.workers,
            });
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::InvalidQueueCapacity);
        }
        Ok(())
    }
}

struct WorkerContext {
    id: usize,
    receiver: Arc<Mutex<mpsc::Receiver<Job>>>,
    requeue: mpsc::WeakSender<Job>,
    client: HttpClient,
    max_retries: u32,
}

/// Fixed set of download workers consuming one bounded queue.
///
/// Created once per process with [`WorkerPool::start`] and stopped with
/// [`WorkerPool::shutdown`]. Any number of [`Batch`]es can feed it at once.
#[derive(Debug)]
pub struct WorkerPool {
    sender: mpsc::Sender<Job>,
    workers: Vec<JoinHandle<()>>,
    config: PoolConfig,
}

impl WorkerPool {
    /// Validates `config` and spawns the workers on the current runtime.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError`] if the configuration is out of bounds.
    #[instrument(level = "debug", skip(client))]
    pub fn start(config: PoolConfig, client: HttpClient) -> Result<Self, PoolError> {
        config.validate()?;

        let (sender, receiver) = mpsc::channel(config.queue_capacity);
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..config.workers)
            .map(|id| {
                let context = WorkerContext {
                    id,
                    receiver: Arc::clone(&receiver),
                    requeue: sender.downgrade(),
                    client: client.clone(),
                    max_retries: config.max_retries,
                };
                tokio::spawn(run_worker(context).instrument(info_span!("worker", id)))
            })
            .collect();

        debug!(
            workers = config.workers,
            queue_capacity = config.queue_capacity,
            max_retries = config.max_retries,
            "worker pool started"
        );

        Ok(Self {
            sender,
            workers,
            config,
        })
    }

    /// Returns the configuration the pool was started with.
    #[must_use]
    pub fn config(&self) -> &PoolConfig {
        &self.config
    }

    /// Admits `entry` to `batch` and queues it.
    ///
    /// Waits for queue space when the queue is full.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Closed`] if every worker has exited. The entry's
    /// work unit is released in that case.
    pub async fn submit(&self, batch: &Arc<Batch>, entry: Entry) -> Result<(), PoolError> {
        let job = batch.admit(entry);
        self.sender.send(job).await.map_err(|_| PoolError::Closed)
    }

    /// Closes the queue, lets the workers drain it and waits for them to exit.
    ///
    /// Retries that come due after the queue closes are abandoned.
    #[instrument(level = "debug", skip(self))]
    pub async fn shutdown(self) {
        let Self {
            sender, workers, ..
        } = self;
        drop(sender);

        for handle in workers {
            if let Err(e) = handle.await {
                warn!(error = %e, "download worker panicked");
            }
        }
        debug!("worker pool stopped");
    }
}

async fn run_worker(context: WorkerContext) {
    loop {
        let next = context.receiver.lock().await.recv().await;
        let Some(job) = next else {
            break;
        };
        process(job, &context).await;
    }
    debug!(worker = context.id, "queue closed, worker exiting");
}

async fn process(mut job: Job, context: &WorkerContext) {
    let path = job.entry.destination_path();
    job.advance(JobState::Downloading);
    job.entry.started_at.get_or_insert_with(Instant::now);

    match context
        .client
        .download_to_path(&job.entry.download_url, &path)
        .await
    {
        Ok(bytes) => job.entry.bytes_written = bytes,
        Err(e) => {
            job.advance(JobState::Failed);
            job.batch.stats().record_failed();
            warn!(
                path = %path.display(),
                retry_count = job.entry.retry_count,
                error = %e,
                "download failed, entry dropped for this run"
            );
            return;
        }
    }

    job.advance(JobState::Verifying);
    match verify_archive_blocking(path.clone()).await {
        Ok(uncompressed) => {
            job.entry.uncompressed_size = uncompressed;
            job.advance(JobState::Done);
            job.complete();
        }
        Err(e) => {
            remove_corrupt(&path).await;
            match after_integrity_failure(job.entry.retry_count, context.max_retries) {
                JobState::Retrying => {
                    job.advance(JobState::Retrying);
                    job.entry.retry_count += 1;
                    warn!(
                        path = %path.display(),
                        retry_count = job.entry.retry_count,
                        error = %e,
                        "archive failed verification, retrying"
                    );
                    requeue(job, context);
                }
                _ => {
                    job.advance(JobState::Abandoned);
                    job.batch.stats().record_abandoned();
                    error!(
                        path = %path.display(),
                        retry_count = job.entry.retry_count,
                        error = %e,
                        "archive failed verification too many times, entry abandoned"
                    );
                }
            }
        }
    }
}

fn requeue(mut job: Job, context: &WorkerContext) {
    let Some(sender) = context.requeue.upgrade() else {
        job.advance(JobState::Abandoned);
        job.batch.stats().record_abandoned();
        info!(
            path = %job.entry.destination_path().display(),
            "pool shutting down, retry abandoned"
        );
        return;
    };

    let batch = Arc::clone(&job.batch);
    match sender.try_send(job) {
        Ok(()) => batch.stats().record_retried(),
        Err(mpsc::error::TrySendError::Full(job)) => {
            // A worker must not wait on a queue that only workers drain, so the
            // wait moves to its own task. The work unit stays with the job.
            debug!(
                path = %job.entry.destination_path().display(),
                "job queue full, retry waiting for space"
            );
            tokio::spawn(async move {
                match sender.send(job).await {
                    Ok(()) => batch.stats().record_retried(),
                    Err(mpsc::error::SendError(job)) => abandon_closed(job, &batch),
                }
            });
        }
        Err(mpsc::error::TrySendError::Closed(job)) => abandon_closed(job, &batch),
    }
}

fn abandon_closed(mut job: Job, batch: &Batch) {
    job.advance(JobState::Abandoned);
    batch.stats().record_abandoned();
    warn!(
        path = %job.entry.destination_path().display(),
        "job queue closed, retry abandoned"
    );
}

async fn remove_corrupt(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => debug!(path = %path.display(), "corrupt file removed"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove corrupt file"),
    }
}
