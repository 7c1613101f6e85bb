//! Error types shared across the statusdir crates.
//!
//! Per-URL fetch and parse failures never surface here: they are contained in
//! the failing URL's [`Entry`](crate::Entry) as error messages and metric
//! tags, so one bad endpoint cannot abort a batch. This enum covers the
//! failures the pipeline itself has to react to.

use thiserror::Error;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or serving the directory.
#[derive(Error, Debug)]
pub enum Error {
    /// The discovery list could not be fetched or was malformed. The caller
    /// treats the candidate list as empty and skips eviction for the cycle.
    #[error("discovery source unavailable: {0}")]
    Source(String),

    /// The validator signalled a rate limit (HTTP 429); retry with backoff.
    #[error("validator rate limited")]
    RateLimited,

    /// The validator failed for a reason other than rate limiting.
    #[error("validator error: {0}")]
    Validator(String),

    /// Writing the directory snapshot to durable storage failed. The cycle
    /// fails loudly; the in-memory directory stays servable.
    #[error("persistence error: {0}")]
    Persistence(String),

    /// The persisted snapshot exists but its format contract is broken.
    /// Fatal at startup.
    #[error("persisted directory is corrupt: {0}")]
    ReloadCorrupt(String),
}
