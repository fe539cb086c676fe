//! Query representations produced by `RelevanceStrategy::prepare`.
//!
//! A representation is built once at session start and read-only
//! thereafter, so it is safe to share across concurrent fetch workers.

use serde::{Deserialize, Serialize};

/// A semantic paraphrase of the query, with its embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryVariation {
    /// Paraphrase text
    pub text: String,

    /// Embedding of the paraphrase
    pub embedding: Vec<f32>,

    /// Tokenized paraphrase, used for provider-free link scoring
    pub terms: Vec<String>,
}

/// Term set for the statistical strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryTerms {
    /// Raw query text
    pub raw: String,

    /// Distinct query terms after normalization, in query order
    pub terms: Vec<String>,
}

/// Query variation space for the embedding strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuerySpace {
    /// Raw query text
    pub raw: String,

    /// Query variations, each probing a facet of the information need
    pub variations: Vec<QueryVariation>,
}

/// One-time output of `RelevanceStrategy::prepare`; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueryRepresentation {
    /// Statistical term set
    Terms(QueryTerms),

    /// Embedding variation space
    Semantic(QuerySpace),
}

impl QueryRepresentation {
    /// The raw query text.
    pub fn raw(&self) -> &str {
        match self {
            Self::Terms(t) => &t.raw,
            Self::Semantic(s) => &s.raw,
        }
    }

    /// Number of distinct query aspects (terms or variations).
    pub fn aspect_count(&self) -> usize {
        match self {
            Self::Terms(t) => t.terms.len(),
            Self::Semantic(s) => s.variations.len(),
        }
    }
}
