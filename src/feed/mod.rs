//! Change feed access: Atom parsing, pagination and the product catalog.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use mml_sync_core::feed::{FeedClient, FeedSettings};
//! use mml_sync_core::{ScopeKey, timestamp::default_epoch};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = FeedClient::new(FeedSettings::new("https://host/tp/feed/mtp", "api-key"))?;
//! let scope = ScopeKey::new("maastotietokanta", "1", "gml");
//! let entries = client
//!     .paginate(&scope, default_epoch(), Path::new("./data"))?
//!     .collect_entries()
//!     .await?;
//! println!("{} entries", entries.len());
//! # Ok(())
//! # }
//! ```

pub mod atom;
mod catalog;
mod client;
mod error;
mod paginator;

pub use catalog::{Product, products_from_feed};
pub use client::{DEFAULT_ATOM_URL, FeedClient, FeedSettings, normalize_next_href};
pub use error::FeedError;
pub use paginator::FeedPaginator;
