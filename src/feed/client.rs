//! HTTP access to the change feed.
//!
//! The `FeedClient` is created once per process and reused for every page,
//! taking advantage of connection pooling.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use tracing::{debug, instrument};
use url::Url;

use super::atom::{AtomFeed, parse_feed};
use super::catalog::{Product, products_from_feed};
use super::error::FeedError;
use super::paginator::FeedPaginator;
use crate::download::constants::{CONNECT_TIMEOUT_SECS, REQUEST_TIMEOUT_SECS};
use crate::redact::redact_url;
use crate::scope::ScopeKey;
use crate::timestamp::QUERY_FORMAT;
use crate::user_agent;

/// Default feed base URL (NLS open data file service).
pub const DEFAULT_ATOM_URL: &str = "https://tiedostopalvelu.maanmittauslaitos.fi/tp/feed/mtp";

/// Where and how to reach the feed.
#[derive(Debug, Clone)]
pub struct FeedSettings {
    /// Feed base URL; scopes are addressed as `{base_url}/{product}/{version}`.
    pub base_url: String,
    /// API key appended to every feed request.
    pub api_key: String,
    /// Timeout for one page fetch.
    pub request_timeout: Duration,
}

impl FeedSettings {
    /// Creates settings with the default page timeout.
    #[must_use]
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            request_timeout: Duration::from_secs(REQUEST_TIMEOUT_SECS),
        }
    }

    /// Overrides the page timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// Client for the paginated change feed and the product catalog.
#[derive(Debug, Clone)]
pub struct FeedClient {
    client: Client,
    settings: FeedSettings,
}

impl FeedClient {
    /// Creates a feed client.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::Client`] if the HTTP client cannot be built and
    /// [`FeedError::InvalidUrl`] if the base URL is not absolute.
    pub fn new(settings: FeedSettings) -> Result<Self, FeedError> {
        Url::parse(&settings.base_url).map_err(|_| FeedError::invalid_url(&settings.base_url))?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(settings.request_timeout)
            .gzip(true)
            .user_agent(user_agent::default_user_agent())
            .build()
            .map_err(FeedError::Client)?;

        Ok(Self { client, settings })
    }

    /// Returns the settings this client was built with.
    #[must_use]
    pub fn settings(&self) -> &FeedSettings {
        &self.settings
    }

    /// Builds the first page URL for a scope, filtered to entries updated at or
    /// after `since`.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidUrl`] if the resulting URL does not parse.
    pub fn scope_url(&self, scope: &ScopeKey, since: DateTime<Utc>) -> Result<Url, FeedError> {
        let raw = format!(
            "{}/{}/{}",
            self.settings.base_url.trim_end_matches('/'),
            scope.product,
            scope.version
        );
        let mut url = Url::parse(&raw).map_err(|_| FeedError::invalid_url(&raw))?;
        url.query_pairs_mut()
            .append_pair("format", &scope.format)
            .append_pair("updated", &since.format(QUERY_FORMAT).to_string())
            .append_pair("api_key", &self.settings.api_key);
        Ok(url)
    }

    /// Builds the catalog URL.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidUrl`] if the base URL does not parse.
    pub fn catalog_url(&self) -> Result<Url, FeedError> {
        let mut url = Url::parse(&self.settings.base_url)
            .map_err(|_| FeedError::invalid_url(&self.settings.base_url))?;
        url.query_pairs_mut()
            .append_pair("api_key", &self.settings.api_key);
        Ok(url)
    }

    /// Fetches and parses one feed page.
    ///
    /// # Errors
    ///
    /// Returns a transport error on network failure, timeout or non-2xx status,
    /// and [`FeedError::Parse`] when the body is not a valid feed.
    #[instrument(level = "debug", skip(self, url), fields(url = %redact_url(url.as_str())))]
    pub async fn fetch_page(&self, url: &Url) -> Result<AtomFeed, FeedError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| FeedError::transport(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::http_status(url.as_str(), status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| FeedError::transport(url.as_str(), e))?;

        let feed = parse_feed(&body).map_err(|e| FeedError::parse(url.as_str(), e.to_string()))?;
        debug!(
            entries = feed.entries.len(),
            has_next = feed.next_href().is_some(),
            "feed page parsed"
        );
        Ok(feed)
    }

    /// Starts paginating a scope's feed.
    ///
    /// Entries are normalized against `root`, the destination directory.
    ///
    /// # Errors
    ///
    /// Returns [`FeedError::InvalidUrl`] if the first page URL cannot be built.
    pub fn paginate(
        &self,
        scope: &ScopeKey,
        since: DateTime<Utc>,
        root: &Path,
    ) -> Result<FeedPaginator<'_>, FeedError> {
        let first = self.scope_url(scope, since)?;
        Ok(FeedPaginator::new(self, first, root))
    }

    /// Lists the products advertised by the catalog feed.
    ///
    /// # Errors
    ///
    /// Returns the same errors as [`fetch_page`](Self::fetch_page).
    #[instrument(level = "debug", skip(self))]
    pub async fn list_products(&self) -> Result<Vec<Product>, FeedError> {
        let url = self.catalog_url()?;
        let feed = self.fetch_page(&url).await?;
        Ok(products_from_feed(feed))
    }
}

/// Rewrites a next-page href so the transport sends it as the server meant it.
///
/// The feed double-escapes ampersands, so `&amp;` survives XML unescaping and
/// is turned back into `&`. A literal `+` in the query (as in `gml+xml`) would
/// be decoded as a space by the server and is sent as `%2B` instead.
#[must_use]
pub fn normalize_next_href(href: &str) -> String {
    let href = href.trim().replace("&amp;", "&");
    match href.split_once('?') {
        Some((base, query)) => format!("{base}?{}", query.replace('+', "%2B")),
        None => href,
    }
}
