//! Error types for sync state persistence. All of them are fatal to a sync.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while loading or saving the state file.
#[derive(Debug, Error)]
pub enum StateError {
    /// Reading, writing or renaming the state file failed.
    #[error("IO error on state file {path}: {source}")]
    Io {
        /// The state (or temporary) file path.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The state file exists but does not decode.
    #[error("state file {path} is corrupt: {source}")]
    Corrupt {
        /// The state file path.
        path: PathBuf,
        /// The underlying decode error.
        #[source]
        source: serde_json::Error,
    },

    /// The state file was written by a newer format.
    #[error("state file {path} has unsupported format version {version}")]
    UnsupportedVersion {
        /// The state file path.
        path: PathBuf,
        /// The version found in the file.
        version: u32,
    },

    /// The in-memory state could not be encoded.
    #[error("failed to encode sync state: {0}")]
    Encode(#[source] serde_json::Error),
}

impl StateError {
    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
