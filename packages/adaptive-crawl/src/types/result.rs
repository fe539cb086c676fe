//! The serializable artifact a finished session hands back to its caller.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::StrategyKind;
use crate::confidence::ConfidenceSnapshot;
use crate::stopping::StopReason;
use crate::types::page::CrawledPage;

/// One crawled page in the session result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    /// Normalized URL
    pub url: String,

    /// Page title if available
    pub title: Option<String>,

    /// Extracted text content
    pub content: String,

    /// SHA-256 content hash
    pub content_hash: String,

    /// Relevance against the query, in [0, 1]
    pub relevance: f32,

    /// Link depth from the seed
    pub depth: u32,

    /// When the page was fetched
    pub fetched_at: DateTime<Utc>,
}

impl From<&CrawledPage> for PageRecord {
    fn from(page: &CrawledPage) -> Self {
        Self {
            url: page.url.clone(),
            title: page.title.clone(),
            content: page.content.clone(),
            content_hash: page.content_hash.clone(),
            relevance: page.relevance,
            depth: page.depth,
            fetched_at: page.fetched_at,
        }
    }
}

/// A candidate still queued when the session ended.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemainingCandidate {
    /// Normalized URL
    pub url: String,

    /// Priority at session end
    pub priority: f32,

    /// Link depth from the seed
    pub depth: u32,
}

/// Counters accumulated over a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionStats {
    /// Pages added to the knowledge base
    pub pages_crawled: usize,

    /// Candidates dropped because their fetch failed
    pub fetch_failures: usize,

    /// Pages scored with relevance 0 because the provider failed
    pub provider_failures: usize,

    /// Pages whose content duplicated an already-crawled page
    pub duplicates_skipped: usize,

    /// Wall-clock duration of the session
    pub duration_ms: u64,
}

/// Final artifact of a crawl session.
///
/// Returned to any caller (CLI, API, library consumer) and sufficient for
/// both programmatic consumption and human reporting. Always produced once
/// a session starts, even on early termination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResult {
    /// Session identifier
    pub session_id: Uuid,

    /// Raw query text
    pub query: String,

    /// Strategy the session ran with
    pub strategy: StrategyKind,

    /// All pages crawled, in crawl order
    pub pages: Vec<PageRecord>,

    /// Confidence at session end
    pub confidence: ConfidenceSnapshot,

    /// Why the session stopped
    pub stop_reason: StopReason,

    /// Frontier entries left uncrawled, best first
    pub frontier_remaining: Vec<RemainingCandidate>,

    /// Session counters
    pub stats: SessionStats,
}
