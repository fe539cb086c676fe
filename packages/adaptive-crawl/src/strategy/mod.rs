//! Relevance strategies.
//!
//! A strategy owns everything query-specific: how the query is represented,
//! how fetched pages are scored against it, how unfetched candidates are
//! prioritized, and how each page folds into the session aggregate. The
//! orchestrator, frontier and confidence model are strategy-agnostic and
//! only see this trait.

pub mod embedding;
pub mod statistical;
pub mod terms;

use async_trait::async_trait;

use crate::config::StrategyKind;
use crate::error::ProviderResult;
use crate::knowledge::{Aggregate, KnowledgeBase};
use crate::types::candidate::CrawlCandidate;
use crate::types::page::{CrawledPage, PageRepresentation};
use crate::types::query::QueryRepresentation;

pub use embedding::EmbeddingStrategy;
pub use statistical::StatisticalStrategy;

/// Output of scoring one fetched page.
#[derive(Debug, Clone)]
pub struct ScoredPage {
    /// Relevance against the query, in [0, 1]
    pub relevance: f32,

    /// Representation to store with the page
    pub representation: PageRepresentation,
}

/// Read-only session state handed to the provider-free scoring paths.
#[derive(Clone, Copy)]
pub struct ScoringContext<'a> {
    /// The prepared query representation
    pub query: &'a QueryRepresentation,

    /// Accumulated knowledge so far
    pub knowledge: &'a KnowledgeBase,
}

/// A pluggable relevance model for one crawl session.
///
/// Only `prepare` and `score_page` may call the external provider; link
/// scoring and aggregate updates run on the hot path between fetches and
/// must be pure and synchronous.
#[async_trait]
pub trait RelevanceStrategy: Send + Sync {
    /// Which strategy this is.
    fn kind(&self) -> StrategyKind;

    /// Build the immutable query representation at session start.
    async fn prepare(&self, query: &str) -> ProviderResult<QueryRepresentation>;

    /// Score a fetched page's content against the query.
    async fn score_page(
        &self,
        url: &str,
        content: &str,
        query: &QueryRepresentation,
    ) -> ProviderResult<ScoredPage>;

    /// Priority of an unfetched candidate, from its anchor context and the
    /// current session state. Higher is better; not required to be in [0, 1].
    fn score_link(&self, candidate: &CrawlCandidate, ctx: &ScoringContext<'_>) -> f32;

    /// The empty aggregate a new knowledge base starts from.
    fn initial_aggregate(&self, query: &QueryRepresentation) -> Aggregate;

    /// Fold a scored page into the aggregate; returns the page's marginal
    /// information gain in [0, 1].
    fn update_aggregate(&self, aggregate: &mut Aggregate, page: &CrawledPage) -> f32;

    /// Fraction of query aspects the aggregate has covered, in [0, 1].
    fn coverage(&self, aggregate: &Aggregate, query: &QueryRepresentation) -> f32;

    /// Whether the knowledge gathered so far indicates the site cannot
    /// answer the query at all. Default: never.
    fn domain_mismatch(&self, _knowledge: &KnowledgeBase, _query: &QueryRepresentation) -> bool {
        false
    }
}
