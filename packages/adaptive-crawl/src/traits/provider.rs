//! Semantic provider trait - the boundary to the embedding model.

use async_trait::async_trait;

use crate::error::ProviderResult;

/// Query expansion and embedding inference, supplied by the caller.
///
/// The engine calls `expand_query` and `embed` once per query variation at
/// prepare time and `embed` once per crawled page at scoring time - never
/// from the frontier re-scoring path, which must stay provider-free. The
/// provider may be slow or rate-limited; per-page failures are tolerated
/// and counted by the session.
#[async_trait]
pub trait SemanticProvider: Send + Sync {
    /// Expand a query into up to `n` semantic paraphrases.
    async fn expand_query(&self, query: &str, n: usize) -> ProviderResult<Vec<String>>;

    /// Generate an embedding for text.
    async fn embed(&self, text: &str) -> ProviderResult<Vec<f32>>;

    /// Generate embeddings for multiple texts.
    ///
    /// The default implementation calls `embed` sequentially.
    async fn embed_batch(&self, texts: &[&str]) -> ProviderResult<Vec<Vec<f32>>> {
        let mut results = Vec::with_capacity(texts.len());
        for text in texts {
            results.push(self.embed(text).await?);
        }
        Ok(results)
    }
}

/// Cosine similarity between two vectors.
///
/// Returns 0.0 for mismatched dimensions or zero-magnitude inputs.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a.sqrt() * norm_b.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cosine_similarity() {
        assert!((cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cosine_similarity_degenerate() {
        assert_eq!(cosine_similarity(&[1.0], &[1.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[], &[]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
