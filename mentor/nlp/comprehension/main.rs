//! Heuristic comprehension: keywords, sentences, tiered matching.

/// Concurrent batch answering.
pub mod advanced;
/// Relevance matching.
pub mod algo;
/// Text normalization, sentence splitting, term ranking.
pub mod helper;
/// Question keyword extraction.
pub mod keywords;
/// Matching tiers.
pub mod method;

pub use advanced::{BatchAnswerController, QuestionBundle};
pub use algo::{find_relevant_sentences, MatchOutcome, RelevanceMatcher};
pub use helper::{normalize, rank_terms, split_sentences};
pub use keywords::{extract_keywords, is_stopword, KeywordPolicy, STOPWORDS};
pub use method::MatchTier;
