//! Text tokenization shared by both strategies.
//!
//! Link scoring must stay provider-free, so even the embedding strategy
//! falls back to lexical overlap here when prioritizing candidates.

/// Common English stopwords excluded from term extraction.
const STOPWORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "all", "can", "had", "her", "was", "one",
    "our", "out", "has", "have", "this", "that", "with", "from", "they", "been", "were", "will",
    "what", "when", "where", "which", "their", "there", "about", "would", "could", "should",
    "other", "into", "more", "some", "such", "than", "then", "them", "these", "those", "only",
    "over", "also", "your", "how", "its", "may", "who", "did", "does", "doing", "each", "own",
    "same", "very", "just", "any", "most", "between", "because", "being", "under", "after",
    "before", "while", "both",
];

/// Whether a normalized token is a stopword.
fn is_stopword(token: &str) -> bool {
    STOPWORDS.contains(&token)
}

/// Tokenize text into normalized content terms.
///
/// Lowercases, splits on non-alphanumeric boundaries, and drops stopwords
/// and tokens shorter than three characters. Preserves text order with
/// duplicates, so callers can build frequency vectors.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|token| token.len() > 2 && !is_stopword(token))
        .map(String::from)
        .collect()
}

/// Tokenize text into its distinct terms, in first-seen order.
pub fn distinct_terms(text: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    tokenize(text)
        .into_iter()
        .filter(|term| seen.insert(term.clone()))
        .collect()
}

/// Fraction of `reference` terms that appear in `candidate` terms.
///
/// Returns 0.0 when the reference is empty.
pub fn overlap_fraction(candidate: &[String], reference: &[String]) -> f32 {
    if reference.is_empty() {
        return 0.0;
    }
    let candidate_set: std::collections::HashSet<&str> =
        candidate.iter().map(String::as_str).collect();
    let hits = reference
        .iter()
        .filter(|term| candidate_set.contains(term.as_str()))
        .count();
    hits as f32 / reference.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_normalizes() {
        let terms = tokenize("The Rust async-runtime, built for speed!");
        assert_eq!(terms, vec!["rust", "async", "runtime", "built", "speed"]);
    }

    #[test]
    fn test_tokenize_drops_short_and_stopwords() {
        let terms = tokenize("it is an ox and the fox");
        assert_eq!(terms, vec!["fox"]);
    }

    #[test]
    fn test_distinct_terms_dedupes_in_order() {
        let terms = distinct_terms("tokio tasks spawn tokio tasks");
        assert_eq!(terms, vec!["tokio", "tasks", "spawn"]);
    }

    #[test]
    fn test_overlap_fraction() {
        let candidate: Vec<String> = ["rust", "async", "tokio"]
            .into_iter()
            .map(String::from)
            .collect();
        let reference: Vec<String> = ["rust", "tokio", "channels", "actors"]
            .into_iter()
            .map(String::from)
            .collect();

        assert!((overlap_fraction(&candidate, &reference) - 0.5).abs() < 1e-6);
        assert_eq!(overlap_fraction(&candidate, &[]), 0.0);
    }
}
