//! Constants for the download module (timeouts, pool sizing, retries).

/// HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Whole-request timeout for feed pages and file downloads (2 minutes).
pub const REQUEST_TIMEOUT_SECS: u64 = 120;

/// Re-attempts after a content-integrity failure before an entry is abandoned.
pub const DEFAULT_MAX_RETRIES: u32 = 5;

/// Default number of download workers.
pub const DEFAULT_WORKERS: usize = 4;

/// Upper bound on download workers.
pub const MAX_WORKERS: usize = 64;

/// Job queue capacity. Large enough for a whole scope plus in-flight retries.
pub const DEFAULT_QUEUE_CAPACITY: usize = 500_000;
