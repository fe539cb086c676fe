//! Typed errors for the adaptive crawl engine.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. Per-candidate failures
//! (`FetchError`, `ProviderError`) are recovered inside the session loop;
//! only `SessionError` reaches the caller.

use thiserror::Error;

/// Fatal, session-level errors.
///
/// Anything recoverable (a single failed fetch, a single failed embedding)
/// is handled inside the crawl loop and surfaces in the session result as
/// counters and a stop reason instead.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The seed URL could not be parsed or is not crawlable; no session
    /// is created.
    #[error("invalid seed URL '{url}': {reason}")]
    InvalidSeed { url: String, reason: String },

    /// The seed URL parsed but the very first fetch failed; no session
    /// state worth returning exists at that point.
    #[error("seed unreachable: {url}")]
    SeedUnreachable {
        url: String,
        #[source]
        source: FetchError,
    },

    /// The provider failed during `prepare`, before any page was crawled.
    #[error("query preparation failed: {0}")]
    Prepare(#[from] ProviderError),

    /// The query produced an empty representation (e.g. only stopwords).
    #[error("invalid query: {reason}")]
    InvalidQuery { reason: String },
}

/// Errors from the page-fetch collaborator.
///
/// These are always per-candidate: the candidate is dropped and the
/// session continues.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level failure
    #[error("fetch failed: {0}")]
    Http(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Fetch exceeded the collaborator's per-fetch timeout
    #[error("timeout fetching: {url}")]
    Timeout { url: String },

    /// The response was not text the engine can score
    #[error("unsupported content at {url}")]
    UnsupportedContent { url: String },

    /// Invalid URL format
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },
}

/// Errors from the embedding provider collaborator.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// Request-level failure (network, auth, serialization)
    #[error("provider request failed: {0}")]
    Request(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The provider throttled the call
    #[error("provider rate limited")]
    RateLimited,

    /// The provider answered with an unusable payload
    #[error("provider returned malformed response: {reason}")]
    Malformed { reason: String },
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = std::result::Result<T, FetchError>;

/// Result type alias for provider operations.
pub type ProviderResult<T> = std::result::Result<T, ProviderError>;
