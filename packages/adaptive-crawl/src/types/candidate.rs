//! Frontier candidates - links discovered but not yet crawled.

use serde::{Deserialize, Serialize};

/// An uncrawled link discovered on a crawled page.
///
/// Created when a crawled page's outgoing links are extracted; leaves the
/// frontier when crawled or when the session ends. A URL is never
/// re-queued once crawled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlCandidate {
    /// Normalized target URL, unique within a session
    pub url: String,

    /// URL of the page the link was discovered on (empty for the seed)
    pub source: String,

    /// Anchor text and surrounding context from the source page
    pub anchor: String,

    /// Link depth from the seed
    pub depth: u32,
}

impl CrawlCandidate {
    /// Create the seed candidate for a session.
    pub fn seed(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            source: String::new(),
            anchor: String::new(),
            depth: 0,
        }
    }

    /// Create a candidate discovered on a page.
    pub fn discovered(
        url: impl Into<String>,
        source: impl Into<String>,
        anchor: impl Into<String>,
        depth: u32,
    ) -> Self {
        Self {
            url: url.into(),
            source: source.into(),
            anchor: anchor.into(),
            depth,
        }
    }
}
