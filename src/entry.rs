//! Downloadable feed entries and their destination layout.
//!
//! Every entry maps deterministically to `root/<dir part of id>/<title>`. The
//! mapping drops empty, `.` and `..` components so a feed can never direct a
//! write outside the destination root.

use std::path::{Path, PathBuf};
use std::time::Instant;

use chrono::{DateTime, Utc};

/// Prefix the feed puts in front of path-like entry identifiers.
pub const URN_PATH_PREFIX: &str = "urn:path:";

/// One downloadable file discovered in the feed for a scope.
#[derive(Debug, Clone)]
pub struct Entry {
    /// Feed-assigned identifier (URN), stable across runs.
    pub id: String,
    /// Link title, falling back to the entry title.
    pub title: String,
    /// Update timestamp reported by the feed.
    pub updated_at: DateTime<Utc>,
    /// Resource to stream to disk.
    pub download_url: String,
    /// Advertised media type, if any.
    pub content_type: Option<String>,
    /// Advertised byte length, if any.
    pub size_hint: Option<u64>,
    /// Directory the file is written into.
    pub destination_dir: PathBuf,
    /// File name inside `destination_dir`.
    pub destination_file: String,
    /// Whether the destination file existed when the entry was discovered.
    pub exists_on_disk: bool,
    /// Number of corruption-triggered re-attempts made so far.
    pub retry_count: u32,
    /// When the current download attempt started.
    pub started_at: Option<Instant>,
    /// Bytes written by the last attempt.
    pub bytes_written: u64,
    /// Summed uncompressed size of the verified archive.
    pub uncompressed_size: u64,
}

impl Entry {
    /// Returns the full destination path.
    #[must_use]
    pub fn destination_path(&self) -> PathBuf {
        self.destination_dir.join(&self.destination_file)
    }
}

/// Resolves the destination directory and file name for an entry.
///
/// The directory is the identifier's path (minus [`URN_PATH_PREFIX`] and its
/// final segment) under `root`. The file name is the last component of `title`,
/// or of the identifier when the title has no usable component.
#[must_use]
pub fn resolve_destination(root: &Path, id: &str, title: &str) -> (PathBuf, String) {
    let relative = id.strip_prefix(URN_PATH_PREFIX).unwrap_or(id);
    let (dir_part, id_file) = match relative.rfind(['/', '\\']) {
        Some(index) => (&relative[..index], &relative[index + 1..]),
        None => ("", relative),
    };

    let mut dir = root.to_path_buf();
    for component in safe_components(dir_part) {
        dir.push(component);
    }

    let file = safe_components(title)
        .last()
        .or_else(|| safe_components(id_file).last())
        .unwrap_or("download")
        .to_string();

    (dir, file)
}

fn safe_components(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(['/', '\\'])
        .map(str::trim)
        .filter(|part| !part.is_empty() && *part != "." && *part != "..")
}
