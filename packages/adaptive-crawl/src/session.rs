//! The crawl session orchestrator.
//!
//! Owns the per-session state machine: pop the best candidates from the
//! frontier, fetch them through a bounded worker pool, score and merge the
//! results, re-prioritize the frontier, and ask the stopping controller
//! whether to keep going. All mutable state (knowledge base, frontier,
//! controller) lives on this task; workers only fetch.

use std::sync::Arc;
use std::time::Instant;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use url::Url;
use uuid::Uuid;

use crate::config::SessionConfig;
use crate::confidence::ConfidenceEvaluator;
use crate::error::{FetchResult, SessionError};
use crate::frontier::{normalize_url, Frontier};
use crate::knowledge::KnowledgeBase;
use crate::stopping::{Decision, Observation, StopReason, StoppingController};
use crate::strategy::{RelevanceStrategy, ScoredPage, ScoringContext};
use crate::traits::PageFetcher;
use crate::types::candidate::CrawlCandidate;
use crate::types::page::{CrawledPage, FetchedPage, PageRepresentation};
use crate::types::result::{PageRecord, SessionResult, SessionStats};

/// One adaptive crawl session over a single site.
///
/// Construct it with a fetcher, a strategy and a config, then drive it to
/// completion with [`run`](Self::run). A session is single-use; run it
/// once and read the [`SessionResult`].
pub struct AdaptiveSession<F, S> {
    fetcher: Arc<F>,
    strategy: Arc<S>,
    config: SessionConfig,
    cancel: CancellationToken,
}

impl<F, S> AdaptiveSession<F, S>
where
    F: PageFetcher + 'static,
    S: RelevanceStrategy + 'static,
{
    /// Create a session.
    pub fn new(fetcher: Arc<F>, strategy: Arc<S>, config: SessionConfig) -> Self {
        Self {
            fetcher,
            strategy,
            config,
            cancel: CancellationToken::new(),
        }
    }

    /// Token the caller can use to cancel the session cooperatively.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Crawl from `seed_url`, guided by `query`, until a stopping
    /// condition fires.
    ///
    /// Per-candidate fetch and provider failures are absorbed into the
    /// result counters; only errors that prevent a session from producing
    /// any result at all surface as `Err`.
    pub async fn run(&self, seed_url: &str, query: &str) -> Result<SessionResult, SessionError> {
        let started = Instant::now();
        let session_id = Uuid::now_v7();

        let seed = validate_seed(seed_url)?;
        if query.trim().is_empty() {
            return Err(SessionError::InvalidQuery {
                reason: "query is empty".to_string(),
            });
        }

        let query_rep = self.strategy.prepare(query).await?;
        if query_rep.aspect_count() == 0 {
            return Err(SessionError::InvalidQuery {
                reason: "query contains no content terms".to_string(),
            });
        }

        tracing::info!(
            session_id = %session_id,
            seed = %seed,
            query = %query,
            strategy = ?self.strategy.kind(),
            "Crawl session starting"
        );

        let mut knowledge = KnowledgeBase::new(self.strategy.initial_aggregate(&query_rep));
        let mut frontier = Frontier::new();
        frontier.push(CrawlCandidate::seed(seed.as_str()), 1.0);

        let evaluator = ConfidenceEvaluator::from_config(&self.config);
        let mut controller = StoppingController::new(&self.config);
        let mut stats = SessionStats::default();

        let mut provider_attempts = 0usize;
        let mut pages_since_rescore = 0usize;
        let deadline = self
            .config
            .session_timeout()
            .map(|timeout| tokio::time::Instant::now() + timeout);

        let mut inflight: JoinSet<(CrawlCandidate, FetchResult<FetchedPage>)> = JoinSet::new();

        let stop_reason = 'crawl: loop {
            if let Some(reason) = controller.decided() {
                break reason;
            }

            // Fill the worker pool from the frontier, within the page budget
            while inflight.len() < self.config.max_concurrent_fetches
                && knowledge.len() + inflight.len() < self.config.max_pages
            {
                let Some(candidate) = frontier.pop_best() else {
                    break;
                };
                // At-most-once: mark before dispatch so a concurrent
                // rediscovery can never queue the same URL again
                if !knowledge.mark_crawled(&candidate.url) {
                    continue;
                }

                tracing::debug!(url = %candidate.url, depth = candidate.depth, "Fetching");
                let fetcher = Arc::clone(&self.fetcher);
                inflight.spawn(async move {
                    let result = fetcher.fetch(&candidate.url).await;
                    (candidate, result)
                });
            }

            if inflight.is_empty() {
                // Nothing to wait on: the frontier is exhausted or the
                // budget is spent
                let confidence =
                    evaluator.evaluate(knowledge.snapshot(), self.strategy.as_ref(), &query_rep);
                let observation = Observation {
                    domain_mismatch: self
                        .strategy
                        .domain_mismatch(&knowledge, &query_rep),
                    provider_degraded: provider_degraded(
                        provider_attempts,
                        stats.provider_failures,
                        self.config.provider_failure_ratio,
                    ),
                    confidence,
                    frontier_empty: frontier.is_empty(),
                    pages_crawled: knowledge.len(),
                    budget_exhausted: knowledge.len() >= self.config.max_pages,
                };
                break match controller.decide(&observation) {
                    Decision::Stop(reason) => reason,
                    Decision::Continue => controller.force(StopReason::FrontierExhausted),
                };
            }

            let timeout = async {
                match deadline {
                    Some(deadline) => tokio::time::sleep_until(deadline).await,
                    None => std::future::pending().await,
                }
            };

            let first = tokio::select! {
                _ = self.cancel.cancelled() => {
                    break 'crawl controller.force(StopReason::Cancelled);
                }
                _ = timeout => {
                    // Wall-clock budget counts as budget exhaustion
                    break 'crawl controller.force(StopReason::MaxPages);
                }
                joined = inflight.join_next() => joined,
            };

            // Merge every already-finished fetch in one pass, in a
            // deterministic order
            let mut batch = Vec::new();
            if let Some(joined) = first {
                batch.push(joined);
            }
            while let Some(joined) = inflight.try_join_next() {
                batch.push(joined);
            }

            let mut completed: Vec<(CrawlCandidate, FetchResult<FetchedPage>)> = Vec::new();
            for joined in batch {
                match joined {
                    Ok(outcome) => completed.push(outcome),
                    Err(join_error) => {
                        tracing::warn!(error = %join_error, "Fetch task failed");
                        stats.fetch_failures += 1;
                    }
                }
            }
            completed.sort_by(|a, b| a.0.url.cmp(&b.0.url));

            for (candidate, fetch_result) in completed {
                let fetched = match fetch_result {
                    Ok(fetched) => fetched,
                    Err(error) => {
                        if knowledge.is_empty() && candidate.depth == 0 {
                            return Err(SessionError::SeedUnreachable {
                                url: candidate.url,
                                source: error,
                            });
                        }
                        tracing::warn!(url = %candidate.url, error = %error, "Fetch failed, candidate dropped");
                        stats.fetch_failures += 1;
                        continue;
                    }
                };

                provider_attempts += 1;
                let scored = match self
                    .strategy
                    .score_page(&candidate.url, &fetched.content, &query_rep)
                    .await
                {
                    Ok(scored) => scored,
                    Err(error) => {
                        // The page is kept, but contributes no signal
                        tracing::warn!(url = %candidate.url, error = %error, "Provider failed scoring page");
                        stats.provider_failures += 1;
                        ScoredPage {
                            relevance: 0.0,
                            representation: PageRepresentation::Missing,
                        }
                    }
                };

                let page = CrawledPage::from_fetched(
                    fetched,
                    candidate.url.as_str(),
                    candidate.depth,
                    scored.relevance,
                    scored.representation,
                );
                let links = page.links.clone();
                let outcome = knowledge.add(page, self.strategy.as_ref());
                if outcome.duplicate_content {
                    stats.duplicates_skipped += 1;
                }

                let ctx = ScoringContext {
                    query: &query_rep,
                    knowledge: &knowledge,
                };
                frontier.insert_links(
                    &candidate.url,
                    &links,
                    candidate.depth + 1,
                    self.strategy.as_ref(),
                    &ctx,
                );
                pages_since_rescore += 1;

                // One stopping check per merged page, so a batch of
                // simultaneous completions cannot overshoot the patience
                // window or the page budget
                let confidence =
                    evaluator.evaluate(knowledge.snapshot(), self.strategy.as_ref(), &query_rep);
                tracing::debug!(
                    pages = knowledge.len(),
                    frontier = frontier.len(),
                    coverage = confidence.coverage,
                    overall = confidence.overall,
                    "Page merged"
                );

                let observation = Observation {
                    domain_mismatch: self.strategy.domain_mismatch(&knowledge, &query_rep),
                    provider_degraded: provider_degraded(
                        provider_attempts,
                        stats.provider_failures,
                        self.config.provider_failure_ratio,
                    ),
                    confidence,
                    // Exhaustion is only decidable once the pool drains;
                    // later pages in this batch may still add links
                    frontier_empty: false,
                    pages_crawled: knowledge.len(),
                    budget_exhausted: knowledge.len() >= self.config.max_pages,
                };
                if let Decision::Stop(reason) = controller.decide(&observation) {
                    break 'crawl reason;
                }
            }

            if pages_since_rescore >= self.config.rescore_batch_size {
                let ctx = ScoringContext {
                    query: &query_rep,
                    knowledge: &knowledge,
                };
                frontier.rescore(self.strategy.as_ref(), &ctx);
                pages_since_rescore = 0;
            }
        };

        inflight.abort_all();

        let confidence =
            evaluator.evaluate(knowledge.snapshot(), self.strategy.as_ref(), &query_rep);
        stats.pages_crawled = knowledge.len();
        stats.duration_ms = started.elapsed().as_millis() as u64;

        tracing::info!(
            session_id = %session_id,
            pages = stats.pages_crawled,
            confidence = confidence.overall,
            stop_reason = ?stop_reason,
            "Crawl session finished"
        );

        Ok(SessionResult {
            session_id,
            query: query.to_string(),
            strategy: self.strategy.kind(),
            pages: knowledge.pages().iter().map(PageRecord::from).collect(),
            confidence,
            stop_reason,
            frontier_remaining: frontier.drain_remaining(),
            stats,
        })
    }
}

/// Parse and normalize the seed URL, rejecting anything uncrawlable.
fn validate_seed(seed_url: &str) -> Result<String, SessionError> {
    let parsed = Url::parse(seed_url).map_err(|error| SessionError::InvalidSeed {
        url: seed_url.to_string(),
        reason: error.to_string(),
    })?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(SessionError::InvalidSeed {
            url: seed_url.to_string(),
            reason: format!("unsupported scheme '{}'", parsed.scheme()),
        });
    }
    normalize_url(seed_url, None).ok_or_else(|| SessionError::InvalidSeed {
        url: seed_url.to_string(),
        reason: "could not normalize".to_string(),
    })
}

/// Whether enough provider calls failed to give up on scoring.
///
/// Needs at least two attempts so a single unlucky first call cannot end
/// the session.
fn provider_degraded(attempts: usize, failures: usize, ratio: f32) -> bool {
    attempts >= 2 && failures as f32 / attempts as f32 >= ratio
}
