//! Download workers, jobs and the streaming HTTP client.
//!
//! A [`WorkerPool`] is started once per process. Each sync invocation creates
//! a [`Batch`], submits its planned entries and waits for the batch to go idle
//! while draining completed entries from the batch's receiver.
//!
//! # Example
//!
//! ```no_run
//! use mml_sync_core::download::{Batch, HttpClient, PoolConfig, WorkerPool};
//! # use mml_sync_core::entry::Entry;
//!
//! # async fn example(entries: Vec<Entry>) -> Result<(), Box<dyn std::error::Error>> {
//! let pool = WorkerPool::start(PoolConfig::default(), HttpClient::new()?)?;
//! let (batch, mut completed) = Batch::new("maastotietokanta/1/gml");
//! for entry in entries {
//!     pool.submit(&batch, entry).await?;
//! }
//! batch.wait_idle().await;
//! drop(batch);
//! while let Some(entry) = completed.recv().await {
//!     println!("{} ({} bytes)", entry.title, entry.bytes_written);
//! }
//! pool.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod client;
pub mod constants;
mod error;
mod job;
mod pool;
mod tracker;

pub use client::HttpClient;
pub use error::DownloadError;
pub use job::{Batch, BatchStats, Job, JobState, after_integrity_failure};
pub use pool::{MIN_WORKERS, PoolConfig, PoolError, WorkerPool};
pub use tracker::{WorkTracker, WorkUnit};
