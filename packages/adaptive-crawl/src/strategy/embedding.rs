//! Embedding-based relevance strategy.
//!
//! Expands the query into semantic variations at prepare time, embeds each
//! crawled page once, and measures relevance as the best cosine similarity
//! against any variation. Coverage is the fraction of variations some page
//! has satisfied. Link scoring stays provider-free: candidates are ranked
//! by lexical overlap between their anchor context and the variations that
//! still lack a satisfying page.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::{SessionConfig, StrategyKind};
use crate::error::ProviderResult;
use crate::knowledge::{Aggregate, KnowledgeBase, SemanticAggregate};
use crate::traits::{cosine_similarity, SemanticProvider};
use crate::types::candidate::CrawlCandidate;
use crate::types::page::{CrawledPage, PageRepresentation};
use crate::types::query::{QueryRepresentation, QuerySpace, QueryVariation};

use super::terms::{distinct_terms, overlap_fraction};
use super::{RelevanceStrategy, ScoredPage, ScoringContext};

/// Semantic relevance model backed by an external embedding provider.
pub struct EmbeddingStrategy<P> {
    provider: Arc<P>,
    n_variations: usize,
    satisfied_threshold: f32,
    min_relevance_threshold: f32,
    min_pages_before_irrelevance: usize,
}

impl<P: SemanticProvider> EmbeddingStrategy<P> {
    /// Create a strategy from a provider and the session's tunables.
    pub fn new(provider: Arc<P>, config: &SessionConfig) -> Self {
        Self {
            provider,
            n_variations: config.n_query_variations.max(1),
            satisfied_threshold: config.variation_satisfied_threshold,
            min_relevance_threshold: config.min_relevance_threshold,
            min_pages_before_irrelevance: config.min_pages_before_irrelevance,
        }
    }

    fn space<'a>(query: &'a QueryRepresentation) -> Option<&'a QuerySpace> {
        match query {
            QueryRepresentation::Semantic(space) => Some(space),
            QueryRepresentation::Terms(_) => None,
        }
    }
}

#[async_trait]
impl<P: SemanticProvider> RelevanceStrategy for EmbeddingStrategy<P> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Embedding
    }

    async fn prepare(&self, query: &str) -> ProviderResult<QueryRepresentation> {
        // The raw query is always variation zero; expansions probe the
        // remaining facets
        let mut texts = vec![query.to_string()];
        if self.n_variations > 1 {
            let expansions = self
                .provider
                .expand_query(query, self.n_variations - 1)
                .await?;
            texts.extend(expansions);
        }
        texts.truncate(self.n_variations);

        let text_refs: Vec<&str> = texts.iter().map(String::as_str).collect();
        let embeddings = self.provider.embed_batch(&text_refs).await?;

        let variations = texts
            .into_iter()
            .zip(embeddings)
            .map(|(text, embedding)| {
                let terms = distinct_terms(&text);
                QueryVariation {
                    text,
                    embedding,
                    terms,
                }
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            query = %query,
            variation_count = variations.len(),
            "Prepared query variation space"
        );

        Ok(QueryRepresentation::Semantic(QuerySpace {
            raw: query.to_string(),
            variations,
        }))
    }

    async fn score_page(
        &self,
        url: &str,
        content: &str,
        query: &QueryRepresentation,
    ) -> ProviderResult<ScoredPage> {
        let embedding = self.provider.embed(content).await?;

        let relevance = Self::space(query)
            .map(|space| {
                space
                    .variations
                    .iter()
                    .map(|v| cosine_similarity(&embedding, &v.embedding))
                    .fold(0.0f32, f32::max)
            })
            .unwrap_or(0.0);

        tracing::trace!(url = %url, relevance, "Scored page against variation space");

        Ok(ScoredPage {
            relevance: relevance.clamp(0.0, 1.0),
            representation: PageRepresentation::Embedding(embedding),
        })
    }

    fn score_link(&self, candidate: &CrawlCandidate, ctx: &ScoringContext<'_>) -> f32 {
        let Some(space) = Self::space(ctx.query) else {
            return 0.0;
        };
        let anchor_terms = distinct_terms(&candidate.anchor);
        if anchor_terms.is_empty() {
            return 0.0;
        }

        let aggregate = match ctx.knowledge.aggregate() {
            Aggregate::Semantic(aggregate) => Some(aggregate),
            Aggregate::Terms(_) => None,
        };

        // Rank anchors by how well they match the variations that still
        // need a page, so the frontier chases unsatisfied facets
        space
            .variations
            .iter()
            .enumerate()
            .map(|(i, variation)| {
                let need = aggregate
                    .map(|a| {
                        let best = a.best_similarity.get(i).copied().unwrap_or(0.0);
                        1.0 - (best / a.satisfied_threshold).min(1.0)
                    })
                    .unwrap_or(1.0);
                need * overlap_fraction(&anchor_terms, &variation.terms)
            })
            .fold(0.0f32, f32::max)
    }

    fn initial_aggregate(&self, query: &QueryRepresentation) -> Aggregate {
        let embeddings = Self::space(query)
            .map(|space| {
                space
                    .variations
                    .iter()
                    .map(|v| v.embedding.clone())
                    .collect()
            })
            .unwrap_or_default();
        Aggregate::Semantic(SemanticAggregate::new(embeddings, self.satisfied_threshold))
    }

    fn update_aggregate(&self, aggregate: &mut Aggregate, page: &CrawledPage) -> f32 {
        let (Aggregate::Semantic(aggregate), PageRepresentation::Embedding(embedding)) =
            (aggregate, &page.representation)
        else {
            return 0.0;
        };

        let similarities: Vec<f32> = aggregate
            .variation_embeddings
            .iter()
            .map(|v| cosine_similarity(embedding, v))
            .collect();
        aggregate.fold(&similarities)
    }

    fn coverage(&self, aggregate: &Aggregate, _query: &QueryRepresentation) -> f32 {
        let Aggregate::Semantic(aggregate) = aggregate else {
            return 0.0;
        };
        if aggregate.best_similarity.is_empty() {
            return 0.0;
        }
        aggregate.satisfied_count() as f32 / aggregate.best_similarity.len() as f32
    }

    fn domain_mismatch(&self, knowledge: &KnowledgeBase, _query: &QueryRepresentation) -> bool {
        knowledge.len() >= self.min_pages_before_irrelevance
            && knowledge.max_relevance() < self.min_relevance_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockProvider;
    use crate::types::page::FetchedPage;

    fn strategy(provider: MockProvider) -> EmbeddingStrategy<MockProvider> {
        EmbeddingStrategy::new(
            Arc::new(provider),
            &SessionConfig::embedding().with_query_variations(3),
        )
    }

    #[tokio::test]
    async fn test_prepare_builds_variation_space() {
        let provider = MockProvider::new().with_expansions(
            "rust runtimes",
            vec!["async executors", "task scheduling"],
        );
        let strategy = strategy(provider);

        let query = strategy.prepare("rust runtimes").await.unwrap();
        let QueryRepresentation::Semantic(space) = &query else {
            panic!("expected semantic representation");
        };

        assert_eq!(space.variations.len(), 3);
        assert_eq!(space.variations[0].text, "rust runtimes");
        assert_eq!(space.variations[1].terms, vec!["async", "executors"]);
    }

    #[tokio::test]
    async fn test_prepare_without_expansions_falls_back_to_query() {
        let strategy = strategy(MockProvider::new());
        let query = strategy.prepare("rust runtimes").await.unwrap();
        assert_eq!(query.aspect_count(), 1);
    }

    #[tokio::test]
    async fn test_relevance_is_best_variation_similarity() {
        let provider = MockProvider::new()
            .with_embedding("rust runtimes", vec![1.0, 0.0, 0.0])
            .with_embedding("executor internals", vec![0.9, 0.1, 0.0])
            .with_embedding("banana bread", vec![0.0, 0.0, 1.0]);
        let strategy = EmbeddingStrategy::new(
            Arc::new(provider),
            &SessionConfig::embedding().with_query_variations(1),
        );

        let query = strategy.prepare("rust runtimes").await.unwrap();
        let on_topic = strategy
            .score_page("https://a/", "executor internals", &query)
            .await
            .unwrap();
        let off_topic = strategy
            .score_page("https://b/", "banana bread", &query)
            .await
            .unwrap();

        assert!(on_topic.relevance > 0.9);
        assert!(off_topic.relevance < 0.1);
    }

    #[tokio::test]
    async fn test_link_priority_chases_unsatisfied_variations() {
        let provider = MockProvider::new()
            .with_expansions("rust runtimes", vec!["work stealing scheduler"])
            .with_embedding("rust runtimes", vec![1.0, 0.0])
            .with_embedding("work stealing scheduler", vec![0.0, 1.0])
            .with_embedding("all about rust runtimes", vec![1.0, 0.0]);
        let strategy = EmbeddingStrategy::new(
            Arc::new(provider),
            &SessionConfig::embedding().with_query_variations(2),
        );

        let query = strategy.prepare("rust runtimes").await.unwrap();
        let mut knowledge = KnowledgeBase::new(strategy.initial_aggregate(&query));

        // Satisfy the first variation
        let scored = strategy
            .score_page("https://a/", "all about rust runtimes", &query)
            .await
            .unwrap();
        knowledge.add(
            CrawledPage::from_fetched(
                FetchedPage::new("https://a/", "all about rust runtimes"),
                "https://a/",
                0,
                scored.relevance,
                scored.representation,
            ),
            &strategy,
        );

        let ctx = ScoringContext {
            query: &query,
            knowledge: &knowledge,
        };
        let satisfied_anchor =
            CrawlCandidate::discovered("https://a/1", "https://a/", "rust runtimes intro", 1);
        let unsatisfied_anchor = CrawlCandidate::discovered(
            "https://a/2",
            "https://a/",
            "work stealing scheduler deep dive",
            1,
        );

        assert!(
            strategy.score_link(&unsatisfied_anchor, &ctx)
                > strategy.score_link(&satisfied_anchor, &ctx)
        );
    }

    #[tokio::test]
    async fn test_domain_mismatch_needs_minimum_pages() {
        let provider = MockProvider::new()
            .with_embedding("rust runtimes", vec![1.0, 0.0])
            .with_embedding("unrelated", vec![0.0, 1.0]);
        let strategy = EmbeddingStrategy::new(
            Arc::new(provider),
            &SessionConfig::embedding()
                .with_query_variations(1)
                .with_min_pages_before_irrelevance(2),
        );

        let query = strategy.prepare("rust runtimes").await.unwrap();
        let mut knowledge = KnowledgeBase::new(strategy.initial_aggregate(&query));
        assert!(!strategy.domain_mismatch(&knowledge, &query));

        for i in 0..2 {
            let url = format!("https://a/{i}");
            let scored = strategy.score_page(&url, "unrelated", &query).await.unwrap();
            knowledge.add(
                CrawledPage::from_fetched(
                    FetchedPage::new(url.as_str(), format!("unrelated {i}")),
                    url.as_str(),
                    0,
                    scored.relevance,
                    scored.representation,
                ),
                &strategy,
            );
        }
        assert!(strategy.domain_mismatch(&knowledge, &query));
    }
}
