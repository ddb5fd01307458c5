use serde::{Deserialize, Serialize};

use crate::comprehension::{
    keywords::{extract_keywords, KeywordPolicy},
    method::MatchTier,
};

/// Sentences selected by one matching tier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    /// Tier that produced the match.
    pub tier: MatchTier,
    /// Keywords used by that tier.
    pub keywords: Vec<String>,
    /// Matching sentences, in document order.
    pub sentences: Vec<String>,
}

/// Keeps the sentences containing at least one keyword (case-insensitive substring).
///
/// No ranking is applied: document order is preserved.
#[must_use]
pub fn find_relevant_sentences(sentences: &[String], keywords: &[String]) -> Vec<String> {
    if keywords.is_empty() {
        return Vec::new();
    }
    sentences
        .iter()
        .filter(|sentence| {
            let lowered = sentence.to_lowercase();
            keywords.iter().any(|keyword| lowered.contains(keyword.as_str()))
        })
        .cloned()
        .collect()
}

/// Two-tier keyword matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelevanceMatcher {
    strict: KeywordPolicy,
    broad: KeywordPolicy,
}

impl RelevanceMatcher {
    /// Creates a matcher from the policies of both tiers.
    #[must_use]
    pub fn new(strict: KeywordPolicy, broad: KeywordPolicy) -> Self {
        Self { strict, broad }
    }

    /// Policy used for `tier`.
    #[must_use]
    pub fn policy(&self, tier: MatchTier) -> KeywordPolicy {
        match tier {
            MatchTier::Strict => self.strict,
            MatchTier::Broad => self.broad,
        }
    }

    /// Runs a single tier.
    #[must_use]
    pub fn run_tier(&self, tier: MatchTier, question: &str, sentences: &[String]) -> MatchOutcome {
        let keywords = extract_keywords(question, &self.policy(tier));
        let matched = find_relevant_sentences(sentences, &keywords);
        MatchOutcome {
            tier,
            keywords,
            sentences: matched,
        }
    }

    /// Strict tier first, broad tier only when strict found nothing.
    ///
    /// Returns `None` when neither tier matched a sentence.
    #[must_use]
    pub fn match_question(&self, question: &str, sentences: &[String]) -> Option<MatchOutcome> {
        [MatchTier::Strict, MatchTier::Broad]
            .into_iter()
            .map(|tier| self.run_tier(tier, question, sentences))
            .find(|outcome| !outcome.sentences.is_empty())
    }
}

impl Default for RelevanceMatcher {
    fn default() -> Self {
        Self::new(KeywordPolicy::STRICT, KeywordPolicy::BROAD)
    }
}
