//! Confidence model.
//!
//! Confidence is assembled from three signals over the knowledge base:
//! coverage (how much of the query the pages answer), consistency (how much
//! the relevant pages agree with each other) and saturation (how fast new
//! pages stopped adding information). The combiner that folds them into a
//! single value is a plain function pointer, so callers can swap in their
//! own weighting scheme without touching the component math.

use serde::{Deserialize, Serialize};

use crate::config::{ConfidenceWeights, SessionConfig};
use crate::knowledge::KnowledgeSnapshot;
use crate::strategy::RelevanceStrategy;
use crate::traits::cosine_similarity;
use crate::types::page::{PageRepresentation, TermVector};
use crate::types::query::QueryRepresentation;

/// Point-in-time confidence components plus their combination.
///
/// `saturation` is the gain ratio of the most recent page against the
/// session mean: near 1.0 while pages still add information, near 0.0 once
/// the crawl has flattened out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSnapshot {
    /// Query-aspect coverage, in [0, 1]
    pub coverage: f32,

    /// Cross-page agreement among relevant pages, in [0, 1]
    pub consistency: f32,

    /// Marginal-gain ratio of the latest page, in [0, 1]
    pub saturation: f32,

    /// Combined confidence, in [0, 1]
    pub overall: f32,
}

/// A function folding the three components into overall confidence.
pub type Combiner = fn(&ConfidenceWeights, f32, f32, f32) -> f32;

/// The default combiner: weighted mean of coverage, consistency and
/// inverted saturation, normalized by the weight sum.
pub fn default_combiner(
    weights: &ConfidenceWeights,
    coverage: f32,
    consistency: f32,
    saturation: f32,
) -> f32 {
    let total = weights.total();
    if total <= 0.0 {
        return 0.0;
    }

    let combined = weights.coverage * coverage
        + weights.consistency * consistency
        + weights.saturation * (1.0 - saturation);
    (combined / total).clamp(0.0, 1.0)
}

/// Computes confidence snapshots from knowledge-base state.
#[derive(Debug, Clone)]
pub struct ConfidenceEvaluator {
    weights: ConfidenceWeights,
    relevance_floor: f32,
    combiner: Combiner,
}

impl ConfidenceEvaluator {
    /// Create an evaluator with the default combiner.
    pub fn new(weights: ConfidenceWeights, relevance_floor: f32) -> Self {
        Self {
            weights,
            relevance_floor,
            combiner: default_combiner,
        }
    }

    /// Create an evaluator from a session config.
    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.weights, config.relevance_floor)
    }

    /// Replace the combining function.
    pub fn with_combiner(mut self, combiner: Combiner) -> Self {
        self.combiner = combiner;
        self
    }

    /// Evaluate confidence over the current knowledge.
    ///
    /// On an empty knowledge base this yields coverage 0, neutral
    /// consistency 0.5 and saturation 1.0, so a fresh session never
    /// reports spurious confidence.
    pub fn evaluate(
        &self,
        snapshot: KnowledgeSnapshot<'_>,
        strategy: &dyn RelevanceStrategy,
        query: &QueryRepresentation,
    ) -> ConfidenceSnapshot {
        let coverage = strategy.coverage(snapshot.aggregate, query).clamp(0.0, 1.0);
        let consistency = self.consistency(&snapshot);
        let saturation = Self::saturation(&snapshot);
        let overall = (self.combiner)(&self.weights, coverage, consistency, saturation);

        ConfidenceSnapshot {
            coverage,
            consistency,
            saturation,
            overall,
        }
    }

    /// Agreement among pages above the relevance floor: one minus the
    /// variance of their pairwise representation similarities. Neutral 0.5
    /// below two qualifying pages.
    fn consistency(&self, snapshot: &KnowledgeSnapshot<'_>) -> f32 {
        let relevant: Vec<&PageRepresentation> = snapshot
            .pages
            .iter()
            .filter(|page| page.relevance >= self.relevance_floor)
            .map(|page| &page.representation)
            .collect();
        if relevant.len() < 2 {
            return 0.5;
        }

        let mut similarities = Vec::new();
        for (i, a) in relevant.iter().enumerate() {
            for b in &relevant[i + 1..] {
                if let Some(similarity) = representation_similarity(a, b) {
                    similarities.push(similarity);
                }
            }
        }
        if similarities.is_empty() {
            return 0.5;
        }

        let mean = similarities.iter().sum::<f32>() / similarities.len() as f32;
        let variance = similarities
            .iter()
            .map(|s| (s - mean).powi(2))
            .sum::<f32>()
            / similarities.len() as f32;

        (1.0 - variance).clamp(0.0, 1.0)
    }

    /// Gain ratio of the latest page against the session mean.
    fn saturation(snapshot: &KnowledgeSnapshot<'_>) -> f32 {
        let Some(last_gain) = snapshot.last_gain() else {
            return 1.0;
        };
        let mean = snapshot.mean_gain();
        if mean <= f32::EPSILON {
            return 0.0;
        }
        (last_gain / mean).clamp(0.0, 1.0)
    }
}

/// Similarity between two page representations, if comparable.
///
/// Term vectors compare by Jaccard overlap of their distinct terms,
/// embeddings by cosine similarity clamped to [0, 1]. Missing
/// representations are incomparable.
fn representation_similarity(a: &PageRepresentation, b: &PageRepresentation) -> Option<f32> {
    match (a, b) {
        (PageRepresentation::Terms(a), PageRepresentation::Terms(b)) => Some(jaccard(a, b)),
        (PageRepresentation::Embedding(a), PageRepresentation::Embedding(b)) => {
            Some(cosine_similarity(a, b).clamp(0.0, 1.0))
        }
        _ => None,
    }
}

fn jaccard(a: &TermVector, b: &TermVector) -> f32 {
    if a.counts.is_empty() && b.counts.is_empty() {
        return 0.0;
    }
    let intersection = a.counts.keys().filter(|term| b.counts.contains_key(*term)).count();
    let union = a.distinct() + b.distinct() - intersection;
    if union == 0 {
        return 0.0;
    }
    intersection as f32 / union as f32
}
