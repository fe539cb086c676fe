//! The prioritized frontier of uncrawled candidates.
//!
//! Single-owner, no locking: the session task is the only writer. Priority
//! order is strategy priority, then shallower depth, then discovery order,
//! so identical inputs always pop in the same order. The frontier is small
//! (bounded by pages crawled times links per page), so a linear scan on
//! pop keeps re-scoring trivially cheap.

use std::collections::HashSet;

use url::Url;

use crate::strategy::{RelevanceStrategy, ScoringContext};
use crate::types::candidate::CrawlCandidate;
use crate::types::page::DiscoveredLink;
use crate::types::result::RemainingCandidate;

/// A queued candidate with its current priority.
#[derive(Debug, Clone)]
struct FrontierEntry {
    candidate: CrawlCandidate,
    priority: f32,
    seq: u64,
}

/// Priority queue of uncrawled candidates, deduplicated by normalized URL.
#[derive(Debug, Default)]
pub struct Frontier {
    entries: Vec<FrontierEntry>,
    queued: HashSet<String>,
    next_seq: u64,
}

/// Normalize a discovered URL against the page it was found on.
///
/// Resolves relative links, strips fragments and trailing slashes, and
/// rejects anything that is not http(s). Returns `None` for links the
/// engine cannot crawl.
pub fn normalize_url(raw: &str, base: Option<&Url>) -> Option<String> {
    let mut url = match base {
        Some(base) => base.join(raw).ok()?,
        None => Url::parse(raw).ok()?,
    };

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.set_fragment(None);
    let path = url.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        url.set_path(&trimmed);
    }

    Some(url.to_string())
}

impl Frontier {
    /// Create an empty frontier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued candidates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no candidates are queued.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Queue a candidate with an explicit priority (used for the seed).
    pub fn push(&mut self, candidate: CrawlCandidate, priority: f32) {
        if !self.queued.insert(candidate.url.clone()) {
            return;
        }
        self.entries.push(FrontierEntry {
            candidate,
            priority,
            seq: self.next_seq,
        });
        self.next_seq += 1;
    }

    /// Queue the outgoing links of a crawled page.
    ///
    /// Links are normalized against the source URL; duplicates of queued or
    /// crawled URLs are dropped. Each new candidate is scored through the
    /// strategy's provider-free link scorer.
    pub fn insert_links(
        &mut self,
        source_url: &str,
        links: &[DiscoveredLink],
        depth: u32,
        strategy: &dyn RelevanceStrategy,
        ctx: &ScoringContext<'_>,
    ) {
        let base = Url::parse(source_url).ok();

        for link in links {
            let Some(url) = normalize_url(&link.url, base.as_ref()) else {
                continue;
            };
            if self.queued.contains(&url) || ctx.knowledge.is_crawled(&url) {
                continue;
            }

            let candidate =
                CrawlCandidate::discovered(url, source_url, link.anchor.as_str(), depth);
            let priority = strategy.score_link(&candidate, ctx);

            tracing::trace!(
                url = %candidate.url,
                priority,
                depth,
                "Candidate queued"
            );

            self.queued.insert(candidate.url.clone());
            self.entries.push(FrontierEntry {
                candidate,
                priority,
                seq: self.next_seq,
            });
            self.next_seq += 1;
        }
    }

    /// Remove and return the best candidate: highest priority, then
    /// shallowest depth, then earliest discovery.
    pub fn pop_best(&mut self) -> Option<CrawlCandidate> {
        let best = self
            .entries
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| {
                a.priority
                    .partial_cmp(&b.priority)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(b.candidate.depth.cmp(&a.candidate.depth))
                    .then(b.seq.cmp(&a.seq))
            })
            .map(|(i, _)| i)?;

        let entry = self.entries.remove(best);
        self.queued.remove(&entry.candidate.url);
        Some(entry.candidate)
    }

    /// Recompute every queued candidate's priority against the current
    /// session state.
    pub fn rescore(&mut self, strategy: &dyn RelevanceStrategy, ctx: &ScoringContext<'_>) {
        for entry in &mut self.entries {
            entry.priority = strategy.score_link(&entry.candidate, ctx);
        }
    }

    /// Drain the frontier into the session result, best first.
    pub fn drain_remaining(&mut self) -> Vec<RemainingCandidate> {
        let mut entries = std::mem::take(&mut self.entries);
        self.queued.clear();

        entries.sort_by(|a, b| {
            b.priority
                .partial_cmp(&a.priority)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then(a.candidate.depth.cmp(&b.candidate.depth))
                .then(a.seq.cmp(&b.seq))
        });

        entries
            .into_iter()
            .map(|entry| RemainingCandidate {
                url: entry.candidate.url,
                priority: entry.priority,
                depth: entry.candidate.depth,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::KnowledgeBase;
    use crate::strategy::StatisticalStrategy;
    use crate::types::query::QueryRepresentation;

    fn prepared(query: &str) -> QueryRepresentation {
        tokio_test::block_on(StatisticalStrategy::new().prepare(query)).unwrap()
    }

    #[test]
    fn test_normalize_url() {
        let base = Url::parse("https://example.com/docs/intro").unwrap();

        assert_eq!(
            normalize_url("../api/", Some(&base)).as_deref(),
            Some("https://example.com/api")
        );
        assert_eq!(
            normalize_url("https://example.com/page#section", None).as_deref(),
            Some("https://example.com/page")
        );
        // Root path keeps its slash
        assert_eq!(
            normalize_url("https://example.com", None).as_deref(),
            Some("https://example.com/")
        );
        assert_eq!(normalize_url("mailto:hi@example.com", Some(&base)), None);
        assert_eq!(normalize_url("::not a url::", None), None);
    }

    #[test]
    fn test_pop_best_ordering() {
        let mut frontier = Frontier::new();
        frontier.push(CrawlCandidate::seed("https://a/low"), 0.1);
        frontier.push(
            CrawlCandidate::discovered("https://a/deep", "https://a/", "x", 3),
            0.9,
        );
        frontier.push(
            CrawlCandidate::discovered("https://a/shallow", "https://a/", "x", 1),
            0.9,
        );

        // Equal priority resolves by shallower depth
        assert_eq!(frontier.pop_best().unwrap().url, "https://a/shallow");
        assert_eq!(frontier.pop_best().unwrap().url, "https://a/deep");
        assert_eq!(frontier.pop_best().unwrap().url, "https://a/low");
        assert!(frontier.pop_best().is_none());
    }

    #[test]
    fn test_insert_links_dedupes() {
        let strategy = StatisticalStrategy::new();
        let query = prepared("rust async");
        let mut knowledge = KnowledgeBase::new(strategy.initial_aggregate(&query));
        knowledge.mark_crawled("https://example.com/crawled");

        let mut frontier = Frontier::new();
        let links = vec![
            DiscoveredLink::new("/docs", "async docs"),
            DiscoveredLink::new("/docs#intro", "same page"),
            DiscoveredLink::new("/crawled", "already crawled"),
            DiscoveredLink::new("mailto:hi@example.com", "mail"),
        ];
        let ctx = ScoringContext {
            query: &query,
            knowledge: &knowledge,
        };
        frontier.insert_links("https://example.com/", &links, 1, &strategy, &ctx);

        assert_eq!(frontier.len(), 1);
        assert_eq!(frontier.pop_best().unwrap().url, "https://example.com/docs");
    }

    #[test]
    fn test_drain_remaining_sorted() {
        let mut frontier = Frontier::new();
        frontier.push(CrawlCandidate::seed("https://a/1"), 0.2);
        frontier.push(CrawlCandidate::seed("https://a/2"), 0.8);

        let remaining = frontier.drain_remaining();
        assert_eq!(remaining.len(), 2);
        assert_eq!(remaining[0].url, "https://a/2");
        assert!(frontier.is_empty());
    }
}
