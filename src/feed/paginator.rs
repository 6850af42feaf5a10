//! Pull-based walk over a scope's paginated feed.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use url::Url;

use super::atom::AtomFeed;
use super::client::{FeedClient, normalize_next_href};
use super::error::FeedError;
use crate::entry::{Entry, resolve_destination};
use crate::redact::redact_url;

/// Walks a feed page by page, turning every downloadable (entry, link) pair
/// into an [`Entry`].
///
/// The sequence is finite and cannot be restarted: each call to
/// [`next_page`](Self::next_page) advances along the feed's `next` links until
/// the last page has been returned. Links already produced by an earlier page
/// are not produced again.
#[derive(Debug)]
pub struct FeedPaginator<'a> {
    client: &'a FeedClient,
    root: PathBuf,
    next_url: Option<Url>,
    visited: HashSet<String>,
    seen_links: HashSet<String>,
    seen_destinations: HashSet<PathBuf>,
    pages_fetched: usize,
}

impl<'a> FeedPaginator<'a> {
    pub(super) fn new(client: &'a FeedClient, first: Url, root: &Path) -> Self {
        Self {
            client,
            root: root.to_path_buf(),
            next_url: Some(first),
            visited: HashSet::new(),
            seen_links: HashSet::new(),
            seen_destinations: HashSet::new(),
            pages_fetched: 0,
        }
    }

    /// Returns the number of pages fetched so far.
    #[must_use]
    pub fn pages_fetched(&self) -> usize {
        self.pages_fetched
    }

    /// Fetches the next page and returns its entries, or `None` once the feed
    /// is exhausted.
    ///
    /// # Errors
    ///
    /// Any transport or parse failure is returned as-is; the walk is not retried.
    /// A `next` link pointing at an already fetched page yields
    /// [`FeedError::PaginationLoop`].
    pub async fn next_page(&mut self) -> Result<Option<Vec<Entry>>, FeedError> {
        let Some(url) = self.next_url.take() else {
            return Ok(None);
        };

        if !self.visited.insert(url.as_str().to_string()) {
            return Err(FeedError::pagination_loop(url.as_str()));
        }

        debug!(
            page = self.pages_fetched + 1,
            url = %redact_url(url.as_str()),
            "fetching feed page"
        );
        let feed = self.client.fetch_page(&url).await?;
        self.pages_fetched += 1;

        if let Some(href) = feed.next_href() {
            let normalized = normalize_next_href(href);
            let next = url
                .join(&normalized)
                .map_err(|_| FeedError::invalid_url(&normalized))?;
            self.next_url = Some(next);
        }

        self.normalize_entries(&url, feed).await.map(Some)
    }

    /// Drains the remaining pages into one list.
    ///
    /// # Errors
    ///
    /// Returns the first error encountered by [`next_page`](Self::next_page).
    pub async fn collect_entries(mut self) -> Result<Vec<Entry>, FeedError> {
        let mut entries = Vec::new();
        while let Some(page) = self.next_page().await? {
            entries.extend(page);
        }
        info!(
            pages = self.pages_fetched,
            entries = entries.len(),
            "feed pagination complete"
        );
        Ok(entries)
    }

    async fn normalize_entries(&mut self, url: &Url, feed: AtomFeed) -> Result<Vec<Entry>, FeedError> {
        let mut entries = Vec::new();
        for atom_entry in feed.entries {
            let downloadable = atom_entry
                .links
                .iter()
                .filter(|link| link.is_downloadable())
                .count();
            for link in atom_entry.links.iter().filter(|link| link.is_downloadable()) {
                let Some(updated_at) = link.updated.or(atom_entry.updated) else {
                    return Err(FeedError::parse(
                        url.as_str(),
                        format!("entry {} has no update timestamp", atom_entry.id),
                    ));
                };

                if !self.seen_links.insert(link.href.clone()) {
                    debug!(id = %atom_entry.id, "duplicate link skipped");
                    continue;
                }

                // Untitled sibling links would all land on the entry title.
                let title = link.title.clone().unwrap_or_else(|| {
                    if downloadable > 1 {
                        href_file_name(&link.href).unwrap_or_else(|| atom_entry.title.clone())
                    } else {
                        atom_entry.title.clone()
                    }
                });
                let (destination_dir, destination_file) =
                    resolve_destination(&self.root, &atom_entry.id, &title);
                if !self
                    .seen_destinations
                    .insert(destination_dir.join(&destination_file))
                {
                    warn!(
                        id = %atom_entry.id,
                        file = %destination_file,
                        "link maps to an already claimed destination, skipped"
                    );
                    continue;
                }
                let exists_on_disk = tokio::fs::try_exists(destination_dir.join(&destination_file))
                    .await
                    .unwrap_or(false);

                entries.push(Entry {
                    id: atom_entry.id.clone(),
                    title,
                    updated_at,
                    download_url: link.href.clone(),
                    content_type: link.media_type.clone(),
                    size_hint: link.length,
                    destination_dir,
                    destination_file,
                    exists_on_disk,
                    retry_count: 0,
                    started_at: None,
                    bytes_written: 0,
                    uncompressed_size: 0,
                });
            }
        }
        Ok(entries)
    }
}

/// Last non-empty path segment of `href`.
fn href_file_name(href: &str) -> Option<String> {
    Url::parse(href)
        .ok()?
        .path_segments()?
        .rev()
        .find(|segment| !segment.is_empty())
        .map(str::to_string)
}
