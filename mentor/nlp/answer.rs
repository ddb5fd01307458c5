use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    comprehension::{
        helper::{normalize, split_sentences},
        MatchOutcome, MatchTier, RelevanceMatcher,
    },
    config::{ComposerSettings, MatcherSettings},
    telemetry::NlpTelemetry,
};

/// Lead-in placed before matched sentences.
pub const MATCH_LEAD_IN: &str = "Based on the document, here's what I found:\n\n";

/// Canned response family chosen when no sentence matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackKind {
    /// "what" / "about" questions.
    Overview,
    /// "summary" / "summarize" questions.
    Summary,
    /// "main" / "key" / "important" questions.
    MainPoints,
    /// "how" questions.
    HowTo,
    /// "when" / "time" questions.
    Temporal,
    /// "where" questions.
    Location,
    /// Anything else.
    NotFound,
}

impl FallbackKind {
    /// Returns human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Overview => "overview",
            Self::Summary => "summary",
            Self::MainPoints => "main_points",
            Self::HowTo => "how_to",
            Self::Temporal => "temporal",
            Self::Location => "location",
            Self::NotFound => "not_found",
        }
    }

    /// Number of leading document sentences quoted by the template.
    #[must_use]
    pub fn excerpt_len(self) -> usize {
        match self {
            Self::Overview | Self::MainPoints | Self::NotFound => 3,
            Self::Summary => 4,
            Self::HowTo | Self::Temporal | Self::Location => 0,
        }
    }
}

/// One row of the fallback rule table.
#[derive(Debug, Clone, Copy)]
pub struct FallbackRule {
    /// Substrings of the lowercased question that select this rule.
    pub triggers: &'static [&'static str],
    /// Template family.
    pub kind: FallbackKind,
}

/// Fallback rules in priority order; the first rule with a matching trigger wins.
pub const FALLBACK_RULES: &[FallbackRule] = &[
    FallbackRule {
        triggers: &["what", "about"],
        kind: FallbackKind::Overview,
    },
    FallbackRule {
        triggers: &["summary", "summarize"],
        kind: FallbackKind::Summary,
    },
    FallbackRule {
        triggers: &["main", "key", "important"],
        kind: FallbackKind::MainPoints,
    },
    FallbackRule {
        triggers: &["how"],
        kind: FallbackKind::HowTo,
    },
    FallbackRule {
        triggers: &["when", "time"],
        kind: FallbackKind::Temporal,
    },
    FallbackRule {
        triggers: &["where"],
        kind: FallbackKind::Location,
    },
];

/// Picks the fallback family for a question by walking [`FALLBACK_RULES`].
#[must_use]
pub fn classify_question(question: &str) -> FallbackKind {
    let lowered = normalize(question);
    FALLBACK_RULES
        .iter()
        .find(|rule| rule.triggers.iter().any(|t| lowered.contains(t)))
        .map_or(FallbackKind::NotFound, |rule| rule.kind)
}

/// Where an answer came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum AnswerSource {
    /// Sentences matched by a tier.
    Matched(MatchTier),
    /// Canned template.
    Template(FallbackKind),
}

impl AnswerSource {
    /// Returns human-readable label.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Matched(tier) => tier.label(),
            Self::Template(kind) => kind.label(),
        }
    }
}

/// Answer produced without a remote model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerDraft {
    /// Final answer text.
    pub content: String,
    /// How the answer was produced.
    pub source: AnswerSource,
    /// Document sentences quoted in `content`.
    pub sentences_used: usize,
}

/// Renders matched sentences or a question-type template.
#[derive(Debug, Clone, Copy)]
pub struct AnswerComposer {
    settings: ComposerSettings,
}

impl AnswerComposer {
    /// Creates a composer.
    #[must_use]
    pub fn new(settings: ComposerSettings) -> Self {
        Self { settings }
    }

    /// Sentence cap for a tier.
    #[must_use]
    pub fn limit(&self, tier: MatchTier) -> usize {
        match tier {
            MatchTier::Strict => self.settings.strict_limit,
            MatchTier::Broad => self.settings.broad_limit,
        }
    }

    /// Joins the first matched sentences behind [`MATCH_LEAD_IN`].
    #[must_use]
    pub fn compose_matched(&self, outcome: &MatchOutcome) -> AnswerDraft {
        let quoted = &outcome.sentences[..outcome.sentences.len().min(self.limit(outcome.tier))];
        AnswerDraft {
            content: format!("{MATCH_LEAD_IN}{}", join_sentences(quoted)),
            source: AnswerSource::Matched(outcome.tier),
            sentences_used: quoted.len(),
        }
    }

    /// Renders the template selected by the question.
    ///
    /// `sentences` are the document's sentences; they may be empty.
    #[must_use]
    pub fn compose_fallback(&self, question: &str, sentences: &[String]) -> AnswerDraft {
        let kind = classify_question(question);
        let quoted = &sentences[..sentences.len().min(kind.excerpt_len())];
        let content = render_template(kind, question.trim(), &join_sentences(quoted));
        AnswerDraft {
            content,
            source: AnswerSource::Template(kind),
            sentences_used: quoted.len(),
        }
    }
}

impl Default for AnswerComposer {
    fn default() -> Self {
        Self::new(ComposerSettings::default())
    }
}

/// `"a. b."`; empty for no sentences.
fn join_sentences(sentences: &[String]) -> String {
    if sentences.is_empty() {
        String::new()
    } else {
        format!("{}.", sentences.join(". "))
    }
}

fn render_template(kind: FallbackKind, question: &str, excerpt: &str) -> String {
    match (kind, excerpt.is_empty()) {
        (FallbackKind::Overview, false) => format!(
            "Based on the document, here's what I can tell you:\n\n{excerpt}\n\nThis appears to be the main content of the document. You can ask more specific questions about particular topics mentioned."
        ),
        (FallbackKind::Overview, true) => "The document doesn't contain enough readable text to describe what it is about. Try a document with more content.".to_string(),
        (FallbackKind::Summary, false) => format!(
            "Here's a summary of the document:\n\n{excerpt}\n\nAsk about any of these points for more detail."
        ),
        (FallbackKind::Summary, true) => "The document doesn't contain enough readable text to summarize. Try a document with more content.".to_string(),
        (FallbackKind::MainPoints, false) => format!(
            "The main points of the document are:\n\n{excerpt}\n\nAsk about any of these points for more detail."
        ),
        (FallbackKind::MainPoints, true) => "The document doesn't contain enough readable text to identify its main points. Try a document with more content.".to_string(),
        (FallbackKind::HowTo, _) => "The document doesn't contain specific \"how-to\" information for your question. However, the document covers various topics that might be related. Try asking about specific concepts or topics mentioned in the document.".to_string(),
        (FallbackKind::Temporal, _) => "The document doesn't contain specific time-related information for your question. The content appears to be more focused on concepts and topics rather than temporal information.".to_string(),
        (FallbackKind::Location, _) => "The document doesn't contain specific location information for your question. The content appears to be more focused on concepts and topics rather than geographical information.".to_string(),
        (FallbackKind::NotFound, false) => format!(
            "I couldn't find specific information about \"{question}\" in the document. However, here's what the document contains:\n\n{excerpt}\n\nTry asking about topics mentioned in the document, or rephrase your question."
        ),
        (FallbackKind::NotFound, true) => format!(
            "I couldn't find specific information about \"{question}\" in the document. Try asking about topics mentioned in the document, or rephrase your question."
        ),
    }
}

/// Answers a question from document text alone.
///
/// Sentence split, tiered keyword match, then composition. Deterministic and
/// free of shared state; safe to call from many threads at once.
#[derive(Debug, Clone)]
pub struct FallbackAnswerer {
    min_sentence_chars: usize,
    matcher: RelevanceMatcher,
    composer: AnswerComposer,
    telemetry: Option<NlpTelemetry>,
}

impl FallbackAnswerer {
    /// Creates an answerer.
    #[must_use]
    pub fn new(
        matcher: &MatcherSettings,
        composer: ComposerSettings,
        telemetry: Option<NlpTelemetry>,
    ) -> Self {
        Self {
            min_sentence_chars: matcher.min_sentence_chars,
            matcher: RelevanceMatcher::new(matcher.strict_policy(), matcher.broad_policy()),
            composer: AnswerComposer::new(composer),
            telemetry,
        }
    }

    /// Produces a non-empty answer. Never fails.
    #[must_use]
    pub fn answer(&self, document: &str, question: &str) -> AnswerDraft {
        let sentences = split_sentences(document, self.min_sentence_chars);
        let draft = match self.matcher.match_question(question, &sentences) {
            Some(outcome) => self.composer.compose_matched(&outcome),
            None => self.composer.compose_fallback(question, &sentences),
        };
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(
                LogLevel::Debug,
                "nlp.answer.composed",
                json!({
                    "source": draft.source.label(),
                    "document_sentences": sentences.len(),
                    "sentences_used": draft.sentences_used,
                }),
            );
        }
        draft
    }
}

impl Default for FallbackAnswerer {
    fn default() -> Self {
        Self::new(&MatcherSettings::default(), ComposerSettings::default(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answer(document: &str, question: &str) -> AnswerDraft {
        FallbackAnswerer::default().answer(document, question)
    }

    #[test]
    fn matched_sentence_is_quoted_behind_lead_in() {
        let draft = answer(
            "The cat sat on the mat. Dogs are loyal animals.",
            "What do dogs do?",
        );
        assert_eq!(
            draft.content,
            "Based on the document, here's what I found:\n\nDogs are loyal animals."
        );
        assert_eq!(draft.source, AnswerSource::Matched(MatchTier::Strict));
        assert_eq!(draft.sentences_used, 1);
    }

    #[test]
    fn strict_tier_quotes_at_most_three_sentences() {
        let doc = "Rust code is fast. Rust code is safe. Rust code is fun. Rust code is popular.";
        let draft = answer(doc, "Tell me about rust code");
        assert_eq!(draft.sentences_used, 3);
        assert!(draft
            .content
            .ends_with("Rust code is fast. Rust code is safe. Rust code is fun."));
    }

    #[test]
    fn broad_tier_quotes_at_most_two_sentences() {
        let doc = "It is sunny today. It is warm outside. It is quiet here.";
        let draft = answer(doc, "is it?");
        assert_eq!(draft.source, AnswerSource::Matched(MatchTier::Broad));
        assert_eq!(
            draft.content,
            format!("{MATCH_LEAD_IN}It is sunny today. It is warm outside.")
        );
    }

    const CITIES: &str = "Paris is nice. London is foggy.";

    #[test]
    fn about_question_without_match_quotes_the_opening() {
        let draft = answer(CITIES, "Tell me about Tokyo");
        assert_eq!(draft.source, AnswerSource::Template(FallbackKind::Overview));
        assert_eq!(draft.sentences_used, 2);
        assert_eq!(
            draft.content,
            "Based on the document, here's what I can tell you:\n\nParis is nice. London is foggy.\n\nThis appears to be the main content of the document. You can ask more specific questions about particular topics mentioned."
        );
    }

    #[test]
    fn how_question_without_match_uses_the_how_to_template() {
        let draft = answer(CITIES, "How does photosynthesis work?");
        assert_eq!(draft.source, AnswerSource::Template(FallbackKind::HowTo));
        assert_eq!(
            draft.content,
            "The document doesn't contain specific \"how-to\" information for your question. However, the document covers various topics that might be related. Try asking about specific concepts or topics mentioned in the document."
        );
    }

    #[test]
    fn where_question_without_match_uses_the_location_template() {
        let draft = answer(CITIES, "Where can I find Tokyo?");
        assert_eq!(draft.source, AnswerSource::Template(FallbackKind::Location));
        assert_eq!(
            draft.content,
            "The document doesn't contain specific location information for your question. The content appears to be more focused on concepts and topics rather than geographical information."
        );
    }

    #[test]
    fn key_points_question_without_match_quotes_the_opening() {
        let draft = answer(CITIES, "List the key points");
        assert_eq!(draft.source, AnswerSource::Template(FallbackKind::MainPoints));
        assert_eq!(
            draft.content,
            "The main points of the document are:\n\nParis is nice. London is foggy.\n\nAsk about any of these points for more detail."
        );
    }

    #[test]
    fn excerpt_templates_have_a_readable_empty_document_form() {
        assert_eq!(
            answer("", "What is this document about?").content,
            "The document doesn't contain enough readable text to describe what it is about. Try a document with more content."
        );
        assert_eq!(
            answer("", "Summarize it").content,
            "The document doesn't contain enough readable text to summarize. Try a document with more content."
        );
        assert_eq!(
            answer("", "List the key points").content,
            "The document doesn't contain enough readable text to identify its main points. Try a document with more content."
        );
        assert_eq!(
            answer("", "Tell me everything").content,
            "I couldn't find specific information about \"Tell me everything\" in the document. Try asking about topics mentioned in the document, or rephrase your question."
        );
    }

    #[test]
    fn when_question_without_match_uses_the_temporal_template() {
        let draft = answer("Paris is nice. London is foggy.", "When was this built?");
        assert_eq!(draft.source, AnswerSource::Template(FallbackKind::Temporal));
        assert!(draft
            .content
            .starts_with("The document doesn't contain specific time-related information"));
        assert_eq!(draft.sentences_used, 0);
    }

    #[test]
    fn empty_document_falls_through_to_the_default_template() {
        let draft = answer("", "Tell me everything");
        assert_eq!(draft.source, AnswerSource::Template(FallbackKind::NotFound));
        assert!(draft
            .content
            .starts_with("I couldn't find specific information about \"Tell me everything\""));
    }

    #[test]
    fn short_fragments_only_still_produce_an_answer() {
        let draft = answer("Hi. Ok. Yes! 42.", "Give me a summary");
        assert_eq!(draft.source, AnswerSource::Template(FallbackKind::Summary));
        assert!(!draft.content.is_empty());
        assert_eq!(draft.sentences_used, 0);
    }

    #[test]
    fn rule_table_priority_is_respected() {
        assert_eq!(classify_question("What is the summary?"), FallbackKind::Overview);
        assert_eq!(classify_question("Summarize it"), FallbackKind::Summary);
        assert_eq!(classify_question("List the KEY ideas"), FallbackKind::MainPoints);
        assert_eq!(classify_question("How does it work"), FallbackKind::HowTo);
        assert_eq!(classify_question("At what time"), FallbackKind::Overview);
        assert_eq!(classify_question("Any timeline?"), FallbackKind::Temporal);
        assert_eq!(classify_question("Where is it"), FallbackKind::Location);
        assert_eq!(classify_question("Explain"), FallbackKind::NotFound);
    }

    #[test]
    fn summary_template_quotes_four_sentences() {
        let doc = "Alpha is the first one. Bravo is the second one. Charlie is the third one. Delta is the fourth one. Echo is the fifth one.";
        let draft = answer(doc, "summarize");
        assert_eq!(draft.source, AnswerSource::Template(FallbackKind::Summary));
        assert_eq!(draft.sentences_used, 4);
        assert!(!draft.content.contains("Echo"));
    }

    #[test]
    fn answering_is_idempotent() {
        let doc = "Ferris is the Rust mascot. Cargo builds crates.";
        let question = "Who is ferris?";
        assert_eq!(answer(doc, question), answer(doc, question));
    }
}
