//! Trait boundaries to the external collaborators.

pub mod fetcher;
pub mod provider;

pub use fetcher::PageFetcher;
pub use provider::{cosine_similarity, SemanticProvider};
