//! Durable per-destination sync state.
//!
//! - [`StateStore`] loads and atomically replaces the state file
//! - [`SyncState`] / [`ScopeStatus`] are the in-memory records
//! - [`EntryLedger`] collects successful entries while a run is in flight

mod error;
mod ledger;
mod store;

pub use error::StateError;
pub use ledger::EntryLedger;
pub use store::{STATE_FILE_NAME, STATE_FORMAT_VERSION, ScopeStatus, StateStore, SyncState};
