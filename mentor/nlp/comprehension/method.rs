use serde::{Deserialize, Serialize};

/// Matching tier that produced a set of relevant sentences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchTier {
    /// Long, non-stopword keywords.
    Strict,
    /// Retry with short words and stopwords once the strict tier found nothing.
    Broad,
}

impl MatchTier {
    /// Returns human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Broad => "broad",
        }
    }
}
