//! Per-scope sync orchestration.
//!
//! # Example
//!
//! ```no_run
//! use mml_sync_core::download::{HttpClient, PoolConfig, WorkerPool};
//! use mml_sync_core::feed::{DEFAULT_ATOM_URL, FeedClient, FeedSettings};
//! use mml_sync_core::sync::{SyncRequest, Synchronizer};
//! use mml_sync_core::ScopeKey;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let feed = FeedClient::new(FeedSettings::new(DEFAULT_ATOM_URL, "my-api-key"))?;
//! let pool = WorkerPool::start(PoolConfig::default(), HttpClient::new()?)?;
//!
//! let request = SyncRequest::new(ScopeKey::new("maastotietokanta", "1", "gml"), "./data");
//! let report = Synchronizer::new(&feed, &pool).sync_scope(&request).await?;
//! println!("{} of {} entries synced", report.completed, report.planned);
//!
//! pool.shutdown().await;
//! # Ok(())
//! # }
//! ```

mod error;
mod orchestrator;
mod request;

pub use error::SyncError;
pub use orchestrator::Synchronizer;
pub use request::{SyncReport, SyncRequest, parse_from_date};
