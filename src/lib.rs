//! MML Sync Core Library
//!
//! Incrementally mirrors the National Land Survey of Finland open data change
//! feed into a local directory. Only entries that are new, updated or missing
//! on disk are downloaded; every download is verified as an archive before it
//! is recorded.
//!
//! # Architecture
//!
//! - [`feed`] - Atom feed client, pagination and product catalog
//! - [`plan`] - Decides which discovered entries to download
//! - [`download`] - Worker pool, streaming HTTP client and job state machine
//! - [`verify`] - Archive integrity check of completed downloads
//! - [`state`] - Durable per-scope sync state
//! - [`sync`] - Drives one scope end to end

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod entry;
pub mod feed;
pub mod plan;
pub mod redact;
pub mod scope;
pub mod state;
pub mod sync;
pub mod timestamp;
mod user_agent;
pub mod verify;

// Re-export commonly used types
pub use download::{Batch, DownloadError, HttpClient, PoolConfig, PoolError, WorkerPool};
pub use entry::Entry;
pub use feed::{DEFAULT_ATOM_URL, FeedClient, FeedError, FeedSettings, Product};
pub use plan::SyncMode;
pub use scope::ScopeKey;
pub use state::{StateError, StateStore, SyncState};
pub use sync::{SyncError, SyncReport, SyncRequest, Synchronizer, parse_from_date};
pub use verify::VerifyError;
