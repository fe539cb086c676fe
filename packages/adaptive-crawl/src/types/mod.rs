//! Core data types for the crawl engine.

pub mod candidate;
pub mod page;
pub mod query;
pub mod result;

pub use candidate::CrawlCandidate;
pub use page::{CrawledPage, DiscoveredLink, FetchedPage, PageRepresentation, TermVector};
pub use query::{QueryRepresentation, QuerySpace, QueryTerms, QueryVariation};
pub use result::{PageRecord, RemainingCandidate, SessionResult, SessionStats};
