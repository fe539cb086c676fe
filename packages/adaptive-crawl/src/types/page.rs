//! Page types - fetched pages and their scored, stored form.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// An outgoing link discovered on a fetched page.
///
/// The anchor field carries the anchor text plus whatever surrounding
/// context the fetch collaborator extracted; it is the only signal the
/// engine has about a page before fetching it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredLink {
    /// Link target (absolute or relative to the source page)
    pub url: String,

    /// Anchor text and surrounding context
    pub anchor: String,
}

impl DiscoveredLink {
    /// Create a new discovered link.
    pub fn new(url: impl Into<String>, anchor: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            anchor: anchor.into(),
        }
    }
}

/// Raw result of fetching a URL, as produced by the fetch collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedPage {
    /// URL that was fetched
    pub url: String,

    /// Extracted text content (usually markdown)
    pub content: String,

    /// Page title if available
    pub title: Option<String>,

    /// Outgoing links with anchor context
    #[serde(default)]
    pub links: Vec<DiscoveredLink>,
}

impl FetchedPage {
    /// Create a new fetched page.
    pub fn new(url: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            content: content.into(),
            title: None,
            links: Vec::new(),
        }
    }

    /// Set the page title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add an outgoing link.
    pub fn with_link(mut self, url: impl Into<String>, anchor: impl Into<String>) -> Self {
        self.links.push(DiscoveredLink::new(url, anchor));
        self
    }
}

/// Term-frequency vector for a page (statistical strategy).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TermVector {
    /// Term to occurrence count, in first-seen order
    pub counts: IndexMap<String, usize>,
}

impl TermVector {
    /// Build a term vector from a token stream.
    pub fn from_terms<I: IntoIterator<Item = String>>(terms: I) -> Self {
        let mut counts = IndexMap::new();
        for term in terms {
            *counts.entry(term).or_insert(0) += 1;
        }
        Self { counts }
    }

    /// Number of distinct terms.
    pub fn distinct(&self) -> usize {
        self.counts.len()
    }

    /// Total term occurrences.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Strategy-dependent representation of a crawled page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageRepresentation {
    /// Term-frequency vector (statistical strategy)
    Terms(TermVector),

    /// Embedding vector (embedding strategy)
    Embedding(Vec<f32>),

    /// No usable representation (e.g. the provider failed for this page);
    /// the page contributes no positive signal
    Missing,
}

/// A page after fetching and scoring, owned by the knowledge base.
///
/// Immutable once added; the content hash is used to detect pages that
/// duplicate content already seen under another URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawledPage {
    /// Normalized URL the page was crawled under
    pub url: String,

    /// Extracted text content
    pub content: String,

    /// SHA-256 hash of the content
    pub content_hash: String,

    /// Page title if available
    pub title: Option<String>,

    /// Outgoing links as discovered
    pub links: Vec<DiscoveredLink>,

    /// Relevance against the session query, in [0, 1]
    pub relevance: f32,

    /// Strategy-dependent representation
    pub representation: PageRepresentation,

    /// Link depth from the seed
    pub depth: u32,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl CrawledPage {
    /// Build a crawled page from a fetch result and its score.
    pub fn from_fetched(
        fetched: FetchedPage,
        url: impl Into<String>,
        depth: u32,
        relevance: f32,
        representation: PageRepresentation,
    ) -> Self {
        let content_hash = Self::hash_content(&fetched.content);
        Self {
            url: url.into(),
            content: fetched.content,
            content_hash,
            title: fetched.title,
            links: fetched.links,
            relevance,
            representation,
            depth,
            fetched_at: Utc::now(),
        }
    }

    /// Calculate SHA-256 hash of content.
    pub fn hash_content(content: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(content.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_content_hash() {
        let hash = CrawledPage::hash_content("Hello, world!");
        assert_eq!(hash.len(), 64); // SHA-256 hex
        assert_eq!(hash, CrawledPage::hash_content("Hello, world!"));
        assert_ne!(hash, CrawledPage::hash_content("Hello, universe!"));
    }

    #[test]
    fn test_term_vector() {
        let vector = TermVector::from_terms(
            ["rust", "async", "rust"].into_iter().map(String::from),
        );
        assert_eq!(vector.distinct(), 2);
        assert_eq!(vector.total(), 3);
        assert_eq!(vector.counts["rust"], 2);
    }

    #[test]
    fn test_fetched_page_builder() {
        let page = FetchedPage::new("https://example.com/", "Home")
            .with_title("Home")
            .with_link("https://example.com/docs", "documentation");

        assert_eq!(page.links.len(), 1);
        assert_eq!(page.links[0].anchor, "documentation");
    }
}
