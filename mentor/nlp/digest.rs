use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    comprehension::helper::{rank_terms, split_sentences},
    config::DigestSettings,
};

/// Overview of an uploaded document.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDigest {
    /// Identifier for follow-up requests.
    pub file_id: Uuid,
    /// Original file name, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    /// Sentence-aligned chunks.
    pub chunks: Vec<String>,
    /// Short extractive summary.
    pub summary: String,
    /// Most frequent long words.
    pub topics: Vec<String>,
    /// Creation time.
    pub generated_at: DateTime<Utc>,
}

impl DocumentDigest {
    /// Builds a digest of `text`.
    #[must_use]
    pub fn build(text: &str, file_name: Option<String>, settings: &DigestSettings) -> Self {
        Self {
            file_id: Uuid::new_v4(),
            file_name,
            chunks: chunk_text(text, settings.chunk_chars, settings.chunk_min_sentence_chars),
            summary: summarize(
                text,
                settings.summary_min_sentence_chars,
                settings.summary_sentences,
            ),
            topics: key_topics(text, settings.topic_min_len, settings.topic_count),
            generated_at: Utc::now(),
        }
    }
}

/// Packs sentences greedily into chunks of at most `max_chars` characters.
///
/// Each sentence contributes `"<sentence>. "`. A sentence longer than
/// `max_chars` gets a chunk of its own.
#[must_use]
pub fn chunk_text(text: &str, max_chars: usize, min_sentence_chars: usize) -> Vec<String> {
    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_chars = 0usize;
    for sentence in split_sentences(text, min_sentence_chars) {
        let sentence_chars = sentence.chars().count();
        if current_chars + sentence_chars > max_chars && !current.is_empty() {
            chunks.push(current.trim().to_string());
            current.clear();
            current_chars = 0;
        }
        current.push_str(&sentence);
        current.push_str(". ");
        current_chars += sentence_chars + 2;
    }
    if !current.trim().is_empty() {
        chunks.push(current.trim().to_string());
    }
    chunks
}

/// `"Document Summary: "` followed by the first `count` long sentences.
#[must_use]
pub fn summarize(text: &str, min_sentence_chars: usize, count: usize) -> String {
    let sentences = split_sentences(text, min_sentence_chars);
    if sentences.is_empty() || count == 0 {
        return "Document Summary: the document has no sentences long enough to summarize."
            .to_string();
    }
    let picked = &sentences[..sentences.len().min(count)];
    format!("Document Summary: {}.", picked.join(". "))
}

/// Most frequent words longer than `min_len` characters.
#[must_use]
pub fn key_topics(text: &str, min_len: usize, limit: usize) -> Vec<String> {
    rank_terms(text, min_len, limit)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunks_respect_the_size_limit() {
        let text = "Alpha sentence number one. Bravo sentence number two. Charlie sentence number three.";
        let chunks = chunk_text(text, 60, 10);
        assert_eq!(
            chunks,
            vec![
                "Alpha sentence number one. Bravo sentence number two.",
                "Charlie sentence number three."
            ]
        );
    }

    #[test]
    fn oversized_sentence_gets_its_own_chunk() {
        let long = "x".repeat(40);
        let text = format!("Short sentence here. {long}. Another short one.");
        let chunks = chunk_text(&text, 30, 10);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[1], format!("{long}."));
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", 500, 10).is_empty());
    }

    #[test]
    fn summary_uses_long_sentences_only() {
        let text = "Too short. This sentence is comfortably long enough. So is this second long sentence. A third sentence that is long. A fourth long sentence to be skipped.";
        assert_eq!(
            summarize(text, 20, 3),
            "Document Summary: This sentence is comfortably long enough. So is this second long sentence. A third sentence that is long."
        );
        assert!(summarize("Tiny.", 20, 3).contains("no sentences"));
    }

    #[test]
    fn digest_collects_everything() {
        let text = "Ownership rules keep memory safe. Borrowing rules extend ownership. Lifetimes describe borrowing scopes.";
        let digest = DocumentDigest::build(text, Some("rust.pdf".into()), &DigestSettings::default());
        assert_eq!(digest.chunks.len(), 1);
        assert_eq!(digest.topics[..2], ["ownership".to_string(), "rules".to_string()]);
        let json = serde_json::to_value(&digest).unwrap();
        assert_eq!(json["fileName"], "rust.pdf");
        assert!(json["fileId"].is_string());
    }
}
