//! Errors that abort a sync invocation.
//!
//! Every variant is fatal to the scope. Integrity failures of single entries
//! are handled inside the worker pool and never show up here.

use std::path::PathBuf;

use thiserror::Error;

use crate::download::PoolError;
use crate::feed::FeedError;
use crate::state::StateError;

/// Fatal sync errors.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A required scope parameter is blank. Raised before any I/O.
    #[error("missing required parameter: {field}")]
    MissingField {
        /// Name of the blank parameter.
        field: &'static str,
    },

    /// The `from_date` option could not be parsed.
    #[error("invalid from date '{value}': expected YYYY-MM-DD, YYYY-MM-DDTHH:MM:SS or RFC 3339")]
    InvalidFromDate {
        /// The rejected input.
        value: String,
    },

    /// The destination root or an entry directory could not be created.
    #[error("failed to create directory {path}: {source}")]
    Destination {
        /// Directory that could not be created.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Paginating the scope's feed failed.
    #[error(transparent)]
    Feed(#[from] FeedError),

    /// Loading or saving sync state failed.
    #[error(transparent)]
    State(#[from] StateError),

    /// The worker pool stopped accepting jobs.
    #[error(transparent)]
    Pool(#[from] PoolError),

    /// The completion drain task panicked.
    #[error("completion drain task failed: {0}")]
    Drain(#[source] tokio::task::JoinError),
}

impl SyncError {
    /// Creates a destination directory error.
    pub fn destination(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Destination {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_field_names_the_parameter() {
        let msg = SyncError::MissingField { field: "format" }.to_string();
        assert!(msg.contains("format"), "Expected field name in: {msg}");
    }

    #[test]
    fn test_destination_error_carries_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let msg = SyncError::destination("/data/mml", io).to_string();
        assert!(msg.contains("/data/mml"), "Expected path in: {msg}");
    }

    #[test]
    fn test_feed_error_is_transparent() {
        let msg = SyncError::from(FeedError::http_status("https://host/feed?api_key=k", 503))
            .to_string();
        assert!(msg.contains("503"), "Expected status in: {msg}");
        assert!(!msg.contains("api_key=k"), "API key leaked in: {msg}");
    }
}
