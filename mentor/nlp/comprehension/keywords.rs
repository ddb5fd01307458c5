use std::collections::HashSet;

use indexmap::IndexSet;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::comprehension::helper::{is_numeric_fragment, normalize};

/// English function words that never count as keywords in the strict tier.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "after", "also", "an", "and", "any", "are", "because", "been", "but", "can",
    "could", "day", "did", "do", "does", "each", "first", "for", "from", "give", "had", "has",
    "have", "how", "into", "is", "it", "its", "most", "new", "not", "of", "on", "or", "other",
    "said", "should", "that", "the", "their", "them", "there", "these", "they", "this", "time",
    "to", "us", "want", "was", "well", "were", "what", "when", "where", "which", "who", "why",
    "will", "with", "would", "you", "your",
];

static STOPWORD_SET: Lazy<HashSet<&'static str>> = Lazy::new(|| STOPWORDS.iter().copied().collect());

/// Returns whether `token` (already lowercased) is a stopword.
#[must_use]
pub fn is_stopword(token: &str) -> bool {
    STOPWORD_SET.contains(token)
}

/// Filtering rules applied when turning a question into keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordPolicy {
    /// Tokens must be strictly longer than this many characters.
    pub min_len: usize,
    /// Whether stopwords are removed.
    pub filter_stopwords: bool,
}

impl KeywordPolicy {
    /// First matching pass: meaningful words only.
    pub const STRICT: Self = Self {
        min_len: 3,
        filter_stopwords: true,
    };

    /// Second matching pass: nearly every token.
    pub const BROAD: Self = Self {
        min_len: 1,
        filter_stopwords: false,
    };
}

/// Extracts keywords from a question.
///
/// Tokens are lowercased, split on whitespace and stripped of surrounding
/// punctuation, then filtered by `policy`. Numeric tokens are always dropped.
/// Duplicates keep their first position.
#[must_use]
pub fn extract_keywords(question: &str, policy: &KeywordPolicy) -> Vec<String> {
    let normalized = normalize(question);
    let mut keywords: IndexSet<String> = IndexSet::new();
    for raw in normalized.split(' ') {
        let token = raw.trim_matches(|ch: char| !ch.is_alphanumeric());
        if token.chars().count() <= policy.min_len {
            continue;
        }
        if policy.filter_stopwords && is_stopword(token) {
            continue;
        }
        if is_numeric_fragment(token) {
            continue;
        }
        keywords.insert(token.to_string());
    }
    keywords.into_iter().collect()
}
