//! Structural integrity check for downloaded archives.
//!
//! A download that completes at the transport level can still be useless: the
//! server may have answered with an error page or an empty body. Opening the
//! file as a zip archive and summing member sizes catches both.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::debug;
use zip::ZipArchive;
use zip::result::ZipError;

/// Smallest plausible summed uncompressed size of a real package.
pub const MIN_UNCOMPRESSED_BYTES: u64 = 10;

/// Content-integrity failures. Always recoverable by re-downloading.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// The file could not be opened.
    #[error("cannot open {path} for verification: {source}")]
    Io {
        /// File under verification.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The file is not a readable archive.
    #[error("{path} is not a valid archive: {source}")]
    Archive {
        /// File under verification.
        path: PathBuf,
        /// The underlying archive error.
        #[source]
        source: ZipError,
    },

    /// The archive is readable but implausibly small.
    #[error("{path} uncompressed size {size} is below the {MIN_UNCOMPRESSED_BYTES} byte minimum")]
    TooSmall {
        /// File under verification.
        path: PathBuf,
        /// Summed uncompressed size.
        size: u64,
    },

    /// The blocking verification task did not complete.
    #[error("verification task for {path} did not complete")]
    Task {
        /// File under verification.
        path: PathBuf,
    },
}

impl VerifyError {
    /// Returns the uncompressed size measured before the check failed, if any.
    #[must_use]
    pub fn measured_size(&self) -> u64 {
        match self {
            Self::TooSmall { size, .. } => *size,
            _ => 0,
        }
    }
}

/// Opens `path` as an archive and returns its summed uncompressed size.
///
/// # Errors
///
/// Returns [`VerifyError`] when the file cannot be opened or parsed as an
/// archive, or when the summed size is below [`MIN_UNCOMPRESSED_BYTES`].
pub fn verify_archive(path: &Path) -> Result<u64, VerifyError> {
    let file = File::open(path).map_err(|source| VerifyError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let archive_error = |source| VerifyError::Archive {
        path: path.to_path_buf(),
        source,
    };

    let mut archive = ZipArchive::new(BufReader::new(file)).map_err(archive_error)?;
    let mut size: u64 = 0;
    for index in 0..archive.len() {
        let member = archive.by_index_raw(index).map_err(archive_error)?;
        size = size.saturating_add(member.size());
    }

    debug!(path = %path.display(), members = archive.len(), size, "archive verified");

    if size < MIN_UNCOMPRESSED_BYTES {
        return Err(VerifyError::TooSmall {
            path: path.to_path_buf(),
            size,
        });
    }
    Ok(size)
}

/// Runs [`verify_archive`] on the blocking thread pool.
///
/// # Errors
///
/// Returns the same errors as [`verify_archive`], plus [`VerifyError::Task`]
/// if the blocking task panicked.
pub async fn verify_archive_blocking(path: PathBuf) -> Result<u64, VerifyError> {
    let task_path = path.clone();
    tokio::task::spawn_blocking(move || verify_archive(&task_path))
        .await
        .map_err(|_| VerifyError::Task { path })?
}
