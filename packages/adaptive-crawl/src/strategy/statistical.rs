//! Statistical relevance strategy.
//!
//! Fully in-process and deterministic: pages are scored by query-term
//! overlap and density, candidates by anchor overlap plus vocabulary
//! novelty, and gain is the fraction of a page's terms that were new to
//! the session vocabulary. Never touches the provider.

use async_trait::async_trait;

use crate::config::StrategyKind;
use crate::error::ProviderResult;
use crate::knowledge::{Aggregate, KnowledgeBase, TermAggregate};
use crate::types::candidate::CrawlCandidate;
use crate::types::page::{CrawledPage, PageRepresentation, TermVector};
use crate::types::query::{QueryRepresentation, QueryTerms};

use super::terms::{distinct_terms, overlap_fraction, tokenize};
use super::{RelevanceStrategy, ScoredPage, ScoringContext};

/// Density scale: a page whose tokens are 5% query terms maxes the
/// density component.
const DENSITY_SCALE: f32 = 20.0;

/// Term-statistical relevance model.
#[derive(Debug, Clone)]
pub struct StatisticalStrategy {
    /// Blend between term coverage and term density in page relevance
    tf_weight: f32,
}

impl Default for StatisticalStrategy {
    fn default() -> Self {
        Self { tf_weight: 0.2 }
    }
}

impl StatisticalStrategy {
    /// Create a strategy with the default density blend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the density blend weight, clamped to [0, 1].
    pub fn with_tf_weight(mut self, weight: f32) -> Self {
        self.tf_weight = weight.clamp(0.0, 1.0);
        self
    }

    fn query_terms<'a>(query: &'a QueryRepresentation) -> &'a [String] {
        match query {
            QueryRepresentation::Terms(t) => &t.terms,
            QueryRepresentation::Semantic(_) => &[],
        }
    }
}

#[async_trait]
impl RelevanceStrategy for StatisticalStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Statistical
    }

    async fn prepare(&self, query: &str) -> ProviderResult<QueryRepresentation> {
        let terms = distinct_terms(query);
        tracing::debug!(query = %query, term_count = terms.len(), "Prepared statistical query");
        Ok(QueryRepresentation::Terms(QueryTerms {
            raw: query.to_string(),
            terms,
        }))
    }

    async fn score_page(
        &self,
        _url: &str,
        content: &str,
        query: &QueryRepresentation,
    ) -> ProviderResult<ScoredPage> {
        let query_terms = Self::query_terms(query);
        let tokens = tokenize(content);
        let vector = TermVector::from_terms(tokens.iter().cloned());

        let relevance = if query_terms.is_empty() || tokens.is_empty() {
            0.0
        } else {
            let coverage = overlap_fraction(&tokens, query_terms);
            let hits: usize = query_terms
                .iter()
                .filter_map(|term| vector.counts.get(term))
                .sum();
            let density = ((hits as f32 / tokens.len() as f32) * DENSITY_SCALE).min(1.0);
            (1.0 - self.tf_weight) * coverage + self.tf_weight * density
        };

        Ok(ScoredPage {
            relevance: relevance.clamp(0.0, 1.0),
            representation: PageRepresentation::Terms(vector),
        })
    }

    /// Information scent: anchors promising query terms and unseen
    /// vocabulary rank high, anchors rehashing known vocabulary sink.
    fn score_link(&self, candidate: &CrawlCandidate, ctx: &ScoringContext<'_>) -> f32 {
        let anchor_terms = distinct_terms(&candidate.anchor);
        if anchor_terms.is_empty() {
            return 0.0;
        }

        let query_terms = Self::query_terms(ctx.query);
        let query_hits = anchor_terms
            .iter()
            .filter(|term| query_terms.contains(*term))
            .count();

        let known = match ctx.knowledge.aggregate() {
            Aggregate::Terms(aggregate) => anchor_terms
                .iter()
                .filter(|term| aggregate.contains(term))
                .count(),
            Aggregate::Semantic(_) => 0,
        };
        let novel = anchor_terms.len() - known;

        (query_hits as f32 + novel as f32) / (1.0 + known as f32)
    }

    fn initial_aggregate(&self, _query: &QueryRepresentation) -> Aggregate {
        Aggregate::Terms(TermAggregate::default())
    }

    fn update_aggregate(&self, aggregate: &mut Aggregate, page: &CrawledPage) -> f32 {
        let (Aggregate::Terms(aggregate), PageRepresentation::Terms(vector)) =
            (aggregate, &page.representation)
        else {
            return 0.0;
        };

        if vector.distinct() == 0 {
            aggregate.pages += 1;
            return 0.0;
        }

        let novel = aggregate.fold(vector);
        novel as f32 / vector.distinct() as f32
    }

    fn coverage(&self, aggregate: &Aggregate, query: &QueryRepresentation) -> f32 {
        let query_terms = Self::query_terms(query);
        let Aggregate::Terms(aggregate) = aggregate else {
            return 0.0;
        };
        if query_terms.is_empty() {
            return 0.0;
        }

        let covered = query_terms
            .iter()
            .filter(|term| aggregate.contains(term))
            .count();
        covered as f32 / query_terms.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::page::FetchedPage;

    fn prepare(query: &str) -> QueryRepresentation {
        tokio_test::block_on(StatisticalStrategy::new().prepare(query)).unwrap()
    }

    #[tokio::test]
    async fn test_score_page_overlap() {
        let strategy = StatisticalStrategy::new();
        let query = strategy.prepare("rust async runtime").await.unwrap();

        let on_topic = strategy
            .score_page("https://a/", "The rust async runtime schedules tasks", &query)
            .await
            .unwrap();
        let off_topic = strategy
            .score_page("https://b/", "Banana bread recipe collection", &query)
            .await
            .unwrap();

        assert!(on_topic.relevance > 0.7);
        assert_eq!(off_topic.relevance, 0.0);
    }

    #[tokio::test]
    async fn test_score_page_empty_content() {
        let strategy = StatisticalStrategy::new();
        let query = strategy.prepare("rust async runtime").await.unwrap();
        let scored = strategy.score_page("https://a/", "", &query).await.unwrap();
        assert_eq!(scored.relevance, 0.0);
    }

    #[test]
    fn test_gain_is_novel_fraction() {
        let strategy = StatisticalStrategy::new();
        let query = prepare("rust");
        let mut aggregate = strategy.initial_aggregate(&query);

        let page = |content: &str| {
            let scored = tokio_test::block_on(strategy.score_page("https://a/", content, &query))
                .unwrap();
            CrawledPage::from_fetched(
                FetchedPage::new("https://a/", content),
                "https://a/",
                0,
                scored.relevance,
                scored.representation,
            )
        };

        // First page: everything is novel
        let gain = strategy.update_aggregate(&mut aggregate, &page("rust tokio channels"));
        assert!((gain - 1.0).abs() < 1e-6);

        // Second page repeats two of three terms
        let gain = strategy.update_aggregate(&mut aggregate, &page("rust tokio spawning"));
        assert!((gain - 1.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_coverage_tracks_vocabulary() {
        let strategy = StatisticalStrategy::new();
        let query = prepare("rust async runtime");
        let mut aggregate = strategy.initial_aggregate(&query);
        assert_eq!(strategy.coverage(&aggregate, &query), 0.0);

        if let Aggregate::Terms(terms) = &mut aggregate {
            terms.fold(&TermVector::from_terms(
                ["rust", "async"].into_iter().map(String::from),
            ));
        }
        assert!((strategy.coverage(&aggregate, &query) - 2.0 / 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_link_priority_prefers_query_anchors() {
        let strategy = StatisticalStrategy::new();
        let query = prepare("rust async runtime");
        let knowledge = KnowledgeBase::new(strategy.initial_aggregate(&query));
        let ctx = ScoringContext {
            query: &query,
            knowledge: &knowledge,
        };

        let on_topic = CrawlCandidate::discovered(
            "https://a/runtime",
            "https://a/",
            "the async runtime internals",
            1,
        );
        let off_topic =
            CrawlCandidate::discovered("https://a/contact", "https://a/", "contact us", 1);

        assert!(strategy.score_link(&on_topic, &ctx) > strategy.score_link(&off_topic, &ctx));
    }
}
