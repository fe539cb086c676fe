//! Page fetcher trait - the boundary to the fetching/browser layer.

use async_trait::async_trait;

use crate::error::FetchResult;
use crate::types::page::FetchedPage;

/// Fetches a URL and returns extracted text plus outgoing links.
///
/// Network I/O, JavaScript execution, HTML-to-text conversion and link
/// extraction all live behind this trait; the engine treats a fetch as a
/// black box with bounded latency. Implementations must be safe to call
/// concurrently and idempotent-safe to retry.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetch a single page.
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage>;
}
