//! Session configuration and confidence weighting.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which relevance strategy drives the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    /// Term-statistical scoring, fully in-process and deterministic.
    Statistical,
    /// Embedding-based scoring via an external provider.
    Embedding,
}

/// Weights for combining coverage, consistency and saturation into the
/// overall confidence value.
///
/// The saturation component enters the default combiner as `1 - saturation`
/// so that confidence rises as marginal gain dies off. Weights are
/// normalized by their sum, so only their ratios matter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceWeights {
    /// Weight for query-aspect coverage
    pub coverage: f32,

    /// Weight for cross-page consistency
    pub consistency: f32,

    /// Weight for (inverted) saturation
    pub saturation: f32,
}

impl Default for ConfidenceWeights {
    fn default() -> Self {
        Self {
            coverage: 0.5,
            consistency: 0.25,
            saturation: 0.25,
        }
    }
}

impl ConfidenceWeights {
    /// Weight coverage only; overall confidence tracks coverage exactly.
    pub fn coverage_only() -> Self {
        Self {
            coverage: 1.0,
            consistency: 0.0,
            saturation: 0.0,
        }
    }

    /// Sum of all weights.
    pub fn total(&self) -> f32 {
        self.coverage + self.consistency + self.saturation
    }
}

/// Configuration for one crawl session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Which relevance strategy to use
    pub strategy: StrategyKind,

    /// Stop once overall confidence reaches this value
    pub target_confidence: f32,

    /// Hard cap on pages crawled per session
    pub max_pages: usize,

    /// Number of query variations generated at prepare (embedding only)
    pub n_query_variations: usize,

    /// Below this max relevance the site is considered off-topic
    /// (embedding only)
    pub min_relevance_threshold: f32,

    /// Pages to crawl before the irrelevance short-circuit may fire
    pub min_pages_before_irrelevance: usize,

    /// Per-variation similarity at which a query variation counts as
    /// satisfied (embedding only)
    pub variation_satisfied_threshold: f32,

    /// Re-score the frontier after this many page additions (1 = every page)
    pub rescore_batch_size: usize,

    /// Bounded fetch worker pool size
    pub max_concurrent_fetches: usize,

    /// Saturation below this value counts as a low-gain page
    pub saturation_threshold: f32,

    /// Consecutive low-gain pages tolerated before stopping
    pub saturation_patience: usize,

    /// Pages with relevance below this floor are excluded from the
    /// consistency measure
    pub relevance_floor: f32,

    /// Stop early once this fraction of provider calls has failed
    pub provider_failure_ratio: f32,

    /// Wall-clock budget for the whole session, in milliseconds.
    /// Exceeding it stops the session the same way the page cap does.
    pub session_timeout_ms: Option<u64>,

    /// Confidence combination weights
    pub weights: ConfidenceWeights,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Statistical,
            target_confidence: 0.8,
            max_pages: 25,
            n_query_variations: 10,
            min_relevance_threshold: 0.1,
            min_pages_before_irrelevance: 3,
            variation_satisfied_threshold: 0.55,
            rescore_batch_size: 1,
            max_concurrent_fetches: 4,
            saturation_threshold: 0.1,
            saturation_patience: 3,
            relevance_floor: 0.3,
            provider_failure_ratio: 0.5,
            session_timeout_ms: None,
            weights: ConfidenceWeights::default(),
        }
    }
}

impl SessionConfig {
    /// Create a config for the given strategy with default tunables.
    pub fn new(strategy: StrategyKind) -> Self {
        Self {
            strategy,
            ..Default::default()
        }
    }

    /// Shorthand for a statistical session.
    pub fn statistical() -> Self {
        Self::new(StrategyKind::Statistical)
    }

    /// Shorthand for an embedding session.
    pub fn embedding() -> Self {
        Self::new(StrategyKind::Embedding)
    }

    /// Set the target confidence.
    pub fn with_target_confidence(mut self, target: f32) -> Self {
        self.target_confidence = target;
        self
    }

    /// Set the page cap.
    pub fn with_max_pages(mut self, max: usize) -> Self {
        self.max_pages = max;
        self
    }

    /// Set the number of query variations (embedding only).
    pub fn with_query_variations(mut self, n: usize) -> Self {
        self.n_query_variations = n;
        self
    }

    /// Set the minimum relevance threshold for the irrelevance
    /// short-circuit (embedding only).
    pub fn with_min_relevance(mut self, threshold: f32) -> Self {
        self.min_relevance_threshold = threshold;
        self
    }

    /// Set how many pages must be crawled before the irrelevance
    /// short-circuit may fire.
    pub fn with_min_pages_before_irrelevance(mut self, pages: usize) -> Self {
        self.min_pages_before_irrelevance = pages;
        self
    }

    /// Set the frontier re-scoring batch size.
    pub fn with_rescore_batch_size(mut self, size: usize) -> Self {
        self.rescore_batch_size = size.max(1);
        self
    }

    /// Set the fetch worker pool size.
    pub fn with_max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = n.max(1);
        self
    }

    /// Set the saturation threshold and patience.
    pub fn with_saturation(mut self, threshold: f32, patience: usize) -> Self {
        self.saturation_threshold = threshold;
        self.saturation_patience = patience;
        self
    }

    /// Set the confidence weights.
    pub fn with_weights(mut self, weights: ConfidenceWeights) -> Self {
        self.weights = weights;
        self
    }

    /// Set the session wall-clock budget.
    pub fn with_session_timeout(mut self, timeout: Duration) -> Self {
        self.session_timeout_ms = Some(timeout.as_millis() as u64);
        self
    }

    /// Session wall-clock budget as a `Duration`, if configured.
    pub fn session_timeout(&self) -> Option<Duration> {
        self.session_timeout_ms.map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = SessionConfig::default();
        assert_eq!(config.strategy, StrategyKind::Statistical);
        assert!((config.target_confidence - 0.8).abs() < f32::EPSILON);
        assert_eq!(config.saturation_patience, 3);
        assert_eq!(config.n_query_variations, 10);
    }

    #[test]
    fn test_builder() {
        let config = SessionConfig::embedding()
            .with_max_pages(10)
            .with_query_variations(5)
            .with_rescore_batch_size(0);

        assert_eq!(config.strategy, StrategyKind::Embedding);
        assert_eq!(config.max_pages, 10);
        assert_eq!(config.n_query_variations, 5);
        // Batch size is clamped to at least one
        assert_eq!(config.rescore_batch_size, 1);
    }

    #[test]
    fn test_weights_total() {
        let weights = ConfidenceWeights::default();
        assert!((weights.total() - 1.0).abs() < 1e-6);

        let coverage_only = ConfidenceWeights::coverage_only();
        assert!((coverage_only.total() - 1.0).abs() < 1e-6);
    }
}
