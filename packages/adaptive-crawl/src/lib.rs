//! Adaptive Crawl Engine
//!
//! A query-driven crawl core that decides, page by page, whether continuing
//! to crawl a site is worth it. Instead of exhausting a site up to a depth
//! or page limit, a session maintains a confidence model over what it has
//! learned and stops as soon as the query is answered, the site turns out
//! to be off-topic, or new pages stop adding information.
//!
//! # Design
//!
//! - Query-driven: the frontier is prioritized by expected relevance to a
//!   natural-language query, not by link order
//! - Strategy-pluggable: term-statistical scoring runs fully in-process;
//!   embedding-based scoring goes through a [`SemanticProvider`]
//! - Confidence-stopped: coverage, consistency and saturation combine into
//!   a single confidence value checked after every page
//! - I/O at the edges: fetching and embedding live behind traits; the
//!   engine itself is deterministic given its collaborators
//!
//! # Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use adaptive_crawl::{AdaptiveSession, SessionConfig, StatisticalStrategy};
//!
//! let fetcher = Arc::new(MyFetcher::new());
//! let strategy = Arc::new(StatisticalStrategy::new());
//! let session = AdaptiveSession::new(fetcher, strategy, SessionConfig::statistical());
//!
//! let result = session.run("https://example.com", "pricing tiers").await?;
//! println!("{:?}: {} pages", result.stop_reason, result.pages.len());
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Collaborator abstractions ([`PageFetcher`], [`SemanticProvider`])
//! - [`types`] - Pages, candidates, query representations, session results
//! - [`strategy`] - Relevance strategies (statistical, embedding)
//! - [`knowledge`] - The per-session knowledge base and aggregates
//! - [`frontier`] - The prioritized candidate queue
//! - [`confidence`] - The coverage/consistency/saturation model
//! - [`stopping`] - The stopping controller
//! - [`session`] - The orchestrator
//! - [`testing`] - Mock implementations for testing

pub mod confidence;
pub mod config;
pub mod error;
pub mod frontier;
pub mod knowledge;
pub mod session;
pub mod stopping;
pub mod strategy;
pub mod testing;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use confidence::{ConfidenceEvaluator, ConfidenceSnapshot};
pub use config::{ConfidenceWeights, SessionConfig, StrategyKind};
pub use error::{FetchError, ProviderError, SessionError};
pub use frontier::Frontier;
pub use knowledge::{Aggregate, KnowledgeBase};
pub use session::AdaptiveSession;
pub use stopping::{StopReason, StoppingController};
pub use strategy::{EmbeddingStrategy, RelevanceStrategy, ScoredPage, StatisticalStrategy};
pub use traits::{PageFetcher, SemanticProvider};
pub use types::{
    candidate::CrawlCandidate,
    page::{CrawledPage, DiscoveredLink, FetchedPage, PageRepresentation},
    query::QueryRepresentation,
    result::{PageRecord, RemainingCandidate, SessionResult, SessionStats},
};
