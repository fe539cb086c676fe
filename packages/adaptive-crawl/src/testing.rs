//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the crawl engine
//! without making real network or embedding-model calls. Both mocks are
//! deterministic and track their calls for assertions.

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use crate::error::{FetchError, FetchResult, ProviderError, ProviderResult};
use crate::traits::{PageFetcher, SemanticProvider};
use crate::types::page::FetchedPage;

/// A mock page fetcher serving a fixed in-memory site.
#[derive(Default)]
pub struct MockFetcher {
    /// Pages by exact URL
    pages: Arc<RwLock<HashMap<String, FetchedPage>>>,

    /// URLs whose fetch always fails
    failures: Arc<RwLock<HashSet<String>>>,

    /// Artificial per-fetch latency
    delay: Option<Duration>,

    /// URLs fetched, in call order
    calls: Arc<RwLock<Vec<String>>>,
}

impl MockFetcher {
    /// Create an empty mock site.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve a page at its own URL.
    pub fn with_page(self, page: FetchedPage) -> Self {
        self.pages
            .write()
            .unwrap()
            .insert(page.url.clone(), page);
        self
    }

    /// Make fetches of a URL fail.
    pub fn with_failure(self, url: impl Into<String>) -> Self {
        self.failures.write().unwrap().insert(url.into());
        self
    }

    /// Add artificial latency to every fetch.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All URLs fetched so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.calls.read().unwrap().clone()
    }

    /// How many times a URL was fetched.
    pub fn fetch_count(&self, url: &str) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|fetched| fetched.as_str() == url)
            .count()
    }
}

#[async_trait]
impl PageFetcher for MockFetcher {
    async fn fetch(&self, url: &str) -> FetchResult<FetchedPage> {
        self.calls.write().unwrap().push(url.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if self.failures.read().unwrap().contains(url) {
            return Err(FetchError::Http(Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "mock fetch failure",
            ))));
        }

        self.pages
            .read()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| {
                FetchError::Http(Box::new(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no mock page at {url}"),
                )))
            })
    }
}

/// Record of a call made to the mock provider.
#[derive(Debug, Clone)]
pub enum MockProviderCall {
    ExpandQuery { query: String },
    Embed { text_len: usize },
}

/// A mock semantic provider with deterministic embeddings.
///
/// Texts without a predefined embedding get one derived from their
/// SHA-256 hash, so equal texts always embed equally and distinct texts
/// almost never collide.
#[derive(Default)]
pub struct MockProvider {
    /// Predefined query expansions
    expansions: Arc<RwLock<HashMap<String, Vec<String>>>>,

    /// Predefined embeddings by text
    embeddings: Arc<RwLock<HashMap<String, Vec<f32>>>>,

    /// Texts whose embedding always fails
    failing_embeddings: Arc<RwLock<HashSet<String>>>,

    /// Queries whose expansion always fails
    failing_expansions: Arc<RwLock<HashSet<String>>>,

    /// Default embedding dimension
    embedding_dim: usize,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockProviderCall>>>,
}

impl MockProvider {
    /// Create a new mock provider with default behavior.
    pub fn new() -> Self {
        Self {
            embedding_dim: 64,
            ..Default::default()
        }
    }

    /// Set the embedding dimension for generated embeddings.
    pub fn with_embedding_dim(mut self, dim: usize) -> Self {
        self.embedding_dim = dim;
        self
    }

    /// Add a predefined query expansion.
    pub fn with_expansions(self, query: impl Into<String>, expansions: Vec<&str>) -> Self {
        self.expansions.write().unwrap().insert(
            query.into(),
            expansions.into_iter().map(String::from).collect(),
        );
        self
    }

    /// Add a predefined embedding for text.
    pub fn with_embedding(self, text: impl Into<String>, embedding: Vec<f32>) -> Self {
        self.embeddings
            .write()
            .unwrap()
            .insert(text.into(), embedding);
        self
    }

    /// Make embedding a specific text fail.
    pub fn with_failing_embedding(self, text: impl Into<String>) -> Self {
        self.failing_embeddings.write().unwrap().insert(text.into());
        self
    }

    /// Make expanding a specific query fail.
    pub fn with_failing_expansion(self, query: impl Into<String>) -> Self {
        self.failing_expansions.write().unwrap().insert(query.into());
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockProviderCall> {
        self.calls.read().unwrap().clone()
    }

    /// Number of embed calls made so far.
    pub fn embed_count(&self) -> usize {
        self.calls
            .read()
            .unwrap()
            .iter()
            .filter(|call| matches!(call, MockProviderCall::Embed { .. }))
            .count()
    }

    /// Generate a deterministic embedding based on text.
    fn generate_deterministic_embedding(&self, text: &str) -> Vec<f32> {
        use sha2::{Digest, Sha256};

        let mut hasher = Sha256::new();
        hasher.update(text.as_bytes());
        let hash = hasher.finalize();

        (0..self.embedding_dim)
            .map(|i| {
                let byte = hash[i % 32] as f32;
                // Normalize to [-1, 1] range
                (byte / 127.5) - 1.0
            })
            .collect()
    }
}

#[async_trait]
impl SemanticProvider for MockProvider {
    async fn expand_query(&self, query: &str, n: usize) -> ProviderResult<Vec<String>> {
        self.calls.write().unwrap().push(MockProviderCall::ExpandQuery {
            query: query.to_string(),
        });

        if self.failing_expansions.read().unwrap().contains(query) {
            return Err(ProviderError::Malformed {
                reason: "mock expansion failure".to_string(),
            });
        }

        let mut expansions = self
            .expansions
            .read()
            .unwrap()
            .get(query)
            .cloned()
            .unwrap_or_default();
        expansions.truncate(n);
        Ok(expansions)
    }

    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>> {
        self.calls.write().unwrap().push(MockProviderCall::Embed {
            text_len: text.len(),
        });

        if self.failing_embeddings.read().unwrap().contains(text) {
            return Err(ProviderError::Request(Box::new(std::io::Error::other(
                "mock embedding failure",
            ))));
        }

        Ok(self
            .embeddings
            .read()
            .unwrap()
            .get(text)
            .cloned()
            .unwrap_or_else(|| self.generate_deterministic_embedding(text)))
    }
}
