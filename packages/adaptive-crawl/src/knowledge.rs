//! The session-scoped knowledge base.
//!
//! Append-only store of crawled pages plus the running aggregate the
//! active strategy folds each page into (term vocabulary or per-variation
//! coverage map). Single-writer: only the orchestrator mutates it, and
//! snapshots are taken only between completed `add` calls, so readers
//! never observe a torn state.

use std::collections::HashSet;

use indexmap::IndexMap;

use crate::strategy::RelevanceStrategy;
use crate::types::page::{CrawledPage, TermVector};

/// Global term vocabulary with document frequencies (statistical strategy).
#[derive(Debug, Clone, Default)]
pub struct TermAggregate {
    /// Term to number of pages containing it, in first-seen order
    pub vocabulary: IndexMap<String, usize>,

    /// Pages folded in so far
    pub pages: usize,
}

impl TermAggregate {
    /// Whether the vocabulary already contains a term.
    pub fn contains(&self, term: &str) -> bool {
        self.vocabulary.contains_key(term)
    }

    /// Fold a page's term vector in; returns the number of terms that
    /// were new to the vocabulary.
    pub fn fold(&mut self, vector: &TermVector) -> usize {
        let mut novel = 0;
        for term in vector.counts.keys() {
            let entry = self.vocabulary.entry(term.clone()).or_insert(0);
            if *entry == 0 {
                novel += 1;
            }
            *entry += 1;
        }
        self.pages += 1;
        novel
    }
}

/// Per-variation coverage map (embedding strategy).
///
/// Tracks, for every query variation, the best similarity any crawled
/// page has reached against it. A variation is satisfied once its best
/// similarity clears the configured threshold.
#[derive(Debug, Clone)]
pub struct SemanticAggregate {
    /// Embedding of each query variation, fixed at prepare time
    pub variation_embeddings: Vec<Vec<f32>>,

    /// Best page similarity seen per variation
    pub best_similarity: Vec<f32>,

    /// Similarity at which a variation counts as satisfied
    pub satisfied_threshold: f32,
}

impl SemanticAggregate {
    /// Create an empty coverage map over the given variation embeddings.
    pub fn new(variation_embeddings: Vec<Vec<f32>>, satisfied_threshold: f32) -> Self {
        let n = variation_embeddings.len();
        Self {
            variation_embeddings,
            best_similarity: vec![0.0; n],
            satisfied_threshold,
        }
    }

    /// Fold a page's per-variation similarities in; returns the mean
    /// improvement across variations (the page's marginal gain).
    pub fn fold(&mut self, similarities: &[f32]) -> f32 {
        if self.best_similarity.is_empty() {
            return 0.0;
        }

        let mut improvement = 0.0f32;
        for (best, sim) in self.best_similarity.iter_mut().zip(similarities.iter()) {
            if *sim > *best {
                improvement += *sim - *best;
                *best = *sim;
            }
        }
        improvement / self.best_similarity.len() as f32
    }

    /// Whether variation `i` is satisfied.
    pub fn is_satisfied(&self, i: usize) -> bool {
        self.best_similarity
            .get(i)
            .is_some_and(|s| *s >= self.satisfied_threshold)
    }

    /// Number of satisfied variations.
    pub fn satisfied_count(&self) -> usize {
        self.best_similarity
            .iter()
            .filter(|s| **s >= self.satisfied_threshold)
            .count()
    }

    /// Index of the variation with the lowest best similarity.
    pub fn least_satisfied(&self) -> Option<usize> {
        self.best_similarity
            .iter()
            .enumerate()
            .min_by(|a, b| a.1.partial_cmp(b.1).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
    }
}

/// Strategy-dependent running aggregate over all crawled pages.
#[derive(Debug, Clone)]
pub enum Aggregate {
    /// Term vocabulary (statistical strategy)
    Terms(TermAggregate),

    /// Variation coverage map (embedding strategy)
    Semantic(SemanticAggregate),
}

/// Outcome of adding one page to the knowledge base.
#[derive(Debug, Clone, Copy)]
pub struct AddOutcome {
    /// Marginal information gain contributed by the page
    pub gain: f32,

    /// The page's content duplicated an already-crawled page
    pub duplicate_content: bool,
}

/// Borrowed, immutable view of the knowledge base for the confidence
/// evaluator. Only taken between completed `add` calls.
#[derive(Debug, Clone, Copy)]
pub struct KnowledgeSnapshot<'a> {
    /// All crawled pages, in crawl order
    pub pages: &'a [CrawledPage],

    /// Running strategy aggregate
    pub aggregate: &'a Aggregate,

    /// Per-page gains, in crawl order
    pub gains: &'a [f32],
}

impl KnowledgeSnapshot<'_> {
    /// Number of pages.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Gain of the most recently crawled page.
    pub fn last_gain(&self) -> Option<f32> {
        self.gains.last().copied()
    }

    /// Running average gain per page.
    pub fn mean_gain(&self) -> f32 {
        if self.gains.is_empty() {
            return 0.0;
        }
        self.gains.iter().sum::<f32>() / self.gains.len() as f32
    }
}

/// The accumulating store of crawled pages for one session.
#[derive(Debug)]
pub struct KnowledgeBase {
    pages: Vec<CrawledPage>,
    crawled: HashSet<String>,
    content_hashes: HashSet<String>,
    aggregate: Aggregate,
    gains: Vec<f32>,
    max_relevance: f32,
}

impl KnowledgeBase {
    /// Create an empty knowledge base with the strategy's initial aggregate.
    pub fn new(aggregate: Aggregate) -> Self {
        Self {
            pages: Vec::new(),
            crawled: HashSet::new(),
            content_hashes: HashSet::new(),
            aggregate,
            gains: Vec::new(),
            max_relevance: 0.0,
        }
    }

    /// Mark a URL as crawled before its fetch is dispatched, so no URL is
    /// ever fetched twice. Returns false if it was already marked.
    pub fn mark_crawled(&mut self, url: &str) -> bool {
        self.crawled.insert(url.to_string())
    }

    /// Whether a URL has been crawled (or is being crawled).
    pub fn is_crawled(&self, url: &str) -> bool {
        self.crawled.contains(url)
    }

    /// Append a page and fold it into the aggregate.
    ///
    /// A page whose content hash duplicates an existing page is stored but
    /// contributes zero gain and does not touch the aggregate.
    pub fn add(&mut self, page: CrawledPage, strategy: &dyn RelevanceStrategy) -> AddOutcome {
        self.crawled.insert(page.url.clone());

        let duplicate_content = !self.content_hashes.insert(page.content_hash.clone());
        let gain = if duplicate_content {
            0.0
        } else {
            strategy.update_aggregate(&mut self.aggregate, &page)
        };

        if page.relevance > self.max_relevance {
            self.max_relevance = page.relevance;
        }

        tracing::debug!(
            url = %page.url,
            relevance = page.relevance,
            gain,
            duplicate_content,
            "Page added to knowledge base"
        );

        self.pages.push(page);
        self.gains.push(gain);

        AddOutcome {
            gain,
            duplicate_content,
        }
    }

    /// Number of pages stored.
    pub fn len(&self) -> usize {
        self.pages.len()
    }

    /// Whether no pages have been stored yet.
    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// All crawled pages, in crawl order.
    pub fn pages(&self) -> &[CrawledPage] {
        &self.pages
    }

    /// The running strategy aggregate.
    pub fn aggregate(&self) -> &Aggregate {
        &self.aggregate
    }

    /// Highest relevance any crawled page has reached.
    pub fn max_relevance(&self) -> f32 {
        self.max_relevance
    }

    /// Immutable view for the confidence evaluator.
    pub fn snapshot(&self) -> KnowledgeSnapshot<'_> {
        KnowledgeSnapshot {
            pages: &self.pages,
            aggregate: &self.aggregate,
            gains: &self.gains,
        }
    }
}
