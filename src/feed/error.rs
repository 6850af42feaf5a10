//! Error types for feed access.
//!
//! Every variant is fatal to the pagination of a scope. URLs are stored with
//! the API key already redacted so errors can be logged as-is.

use thiserror::Error;

use crate::redact::redact_url;

/// Errors that can occur while fetching or parsing a feed page.
#[derive(Debug, Error)]
pub enum FeedError {
    /// Network-level error (DNS resolution, connection refused, TLS errors, etc.)
    #[error("network error fetching feed {url}: {source}")]
    Network {
        /// The page URL that failed.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout fetching feed {url}")]
    Timeout {
        /// The page URL that timed out.
        url: String,
    },

    /// Non-success HTTP response.
    #[error("HTTP {status} fetching feed {url}")]
    HttpStatus {
        /// The page URL that returned an error status.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The page body is not a well-formed feed.
    #[error("malformed feed page {url}: {message}")]
    Parse {
        /// The page URL whose body failed to parse.
        url: String,
        /// What was wrong with the page.
        message: String,
    },

    /// A feed or next-page URL could not be parsed.
    #[error("invalid feed URL: {url}")]
    InvalidUrl {
        /// The invalid URL string.
        url: String,
    },

    /// A "next" link pointed back at a page that was already fetched.
    #[error("feed pagination loops back to {url}")]
    PaginationLoop {
        /// The repeated page URL.
        url: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build feed HTTP client: {0}")]
    Client(#[source] reqwest::Error),
}

impl FeedError {
    /// Creates a network or timeout error from a reqwest error.
    pub fn transport(url: &str, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout {
                url: redact_url(url),
            }
        } else {
            Self::Network {
                url: redact_url(url),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: &str, status: u16) -> Self {
        Self::HttpStatus {
            url: redact_url(url),
            status,
        }
    }

    /// Creates a parse error.
    pub fn parse(url: &str, message: impl Into<String>) -> Self {
        Self::Parse {
            url: redact_url(url),
            message: message.into(),
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: &str) -> Self {
        Self::InvalidUrl {
            url: redact_url(url),
        }
    }

    /// Creates a pagination loop error.
    pub fn pagination_loop(url: &str) -> Self {
        Self::PaginationLoop {
            url: redact_url(url),
        }
    }
}
