use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("whitespace regex"));
static SENTENCE_BREAK: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[.!?]+").expect("sentence break regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").expect("non-word regex"));

/// Lowercases and collapses whitespace runs into single spaces.
#[must_use]
pub fn normalize(text: &str) -> String {
    WHITESPACE
        .replace_all(text.trim(), " ")
        .to_lowercase()
}

/// Splits text on runs of `.`, `!` and `?`.
///
/// Fragments are trimmed; fragments of `min_chars` characters or fewer and
/// purely numeric fragments are dropped. Order is preserved.
#[must_use]
pub fn split_sentences(text: &str, min_chars: usize) -> Vec<String> {
    SENTENCE_BREAK
        .split(text)
        .map(str::trim)
        .filter(|fragment| fragment.chars().count() > min_chars)
        .filter(|fragment| !is_numeric_fragment(fragment))
        .map(ToString::to_string)
        .collect()
}

/// True when the fragment holds digits and nothing but digits, separators and whitespace.
#[must_use]
pub fn is_numeric_fragment(fragment: &str) -> bool {
    let mut digits = 0usize;
    for ch in fragment.chars() {
        if ch.is_ascii_digit() {
            digits += 1;
        } else if !(ch.is_whitespace() || matches!(ch, ',' | '-' | '+' | '%' | '/' | ':')) {
            return false;
        }
    }
    digits > 0
}

/// Most frequent words longer than `min_len` characters, best first.
///
/// Punctuation is replaced by spaces before splitting. Equal counts keep the
/// order in which the words first appear.
#[must_use]
pub fn rank_terms(text: &str, min_len: usize, limit: usize) -> Vec<String> {
    let cleaned = NON_WORD.replace_all(&text.to_lowercase(), " ").into_owned();
    let mut counts: IndexMap<&str, usize> = IndexMap::new();
    for word in cleaned.split_whitespace() {
        if word.chars().count() > min_len {
            *counts.entry(word).or_insert(0) += 1;
        }
    }
    // Stable sort keeps insertion order for ties.
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked
        .into_iter()
        .take(limit)
        .map(|(word, _)| word.to_string())
        .collect()
}
