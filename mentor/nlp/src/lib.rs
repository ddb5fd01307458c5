#![deny(
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    missing_docs,
    rust_2018_idioms
)]
#![allow(clippy::module_name_repetitions)]

//! MentorAI document question answering.
//!
//! Questions about a document go to a remote text generator when one is
//! configured; when it fails, or when there is none, a deterministic keyword
//! matcher answers from the document's own sentences. The crate also builds
//! document digests (chunks, summary, topics) and concept mind maps.

/// Heuristic answer composition.
#[path = "../answer.rs"]
pub mod answer;

/// Request-level entry points.
#[path = "../assistant.rs"]
pub mod assistant;

/// Keyword extraction, sentence splitting and relevance matching.
#[path = "../comprehension/main.rs"]
pub mod comprehension;

/// TOML configuration.
#[path = "../config.rs"]
pub mod config;

/// Console command ingestion.
#[path = "../consolecmdreciever.rs"]
pub mod consolecmdreciever;

/// Document digests.
#[path = "../digest.rs"]
pub mod digest;

/// Remote generation seam and prompts.
#[path = "../generation.rs"]
pub mod generation;

/// Concept mind maps.
#[path = "../mindmap.rs"]
pub mod mindmap;

/// OpenAI-compatible client.
#[path = "../remote.rs"]
pub mod remote;

/// Telemetry helpers.
#[path = "../telemetry.rs"]
pub mod telemetry;

pub use answer::{
    classify_question, AnswerComposer, AnswerDraft, AnswerSource, FallbackAnswerer, FallbackKind,
    FALLBACK_RULES, MATCH_LEAD_IN,
};
pub use assistant::{AnswerOrigin, AskError, AskRequest, AskResponse, DocumentAssistant};
pub use comprehension::{
    extract_keywords, find_relevant_sentences, split_sentences, BatchAnswerController,
    KeywordPolicy, MatchOutcome, MatchTier, QuestionBundle, RelevanceMatcher,
};
pub use config::NlpConfig;
pub use consolecmdreciever::{execute_command, ConsoleCommand, ConsoleCommandReceiver};
pub use digest::DocumentDigest;
pub use generation::{GenerationError, GenerationPrompt, TextGenerator};
pub use mindmap::{basic_mind_map, MindMap};
pub use remote::OpenAiChatGenerator;
pub use telemetry::{NlpTelemetry, NlpTelemetryBuilder};

/// Answers `question` from `document` alone using default settings.
///
/// ```
/// let answer = mentor_nlp::answer_from_document(
///     "The cat sat on the mat. Dogs are loyal animals.",
///     "What do dogs do?",
/// );
/// assert_eq!(
///     answer,
///     "Based on the document, here's what I found:\n\nDogs are loyal animals."
/// );
/// ```
#[must_use]
pub fn answer_from_document(document: &str, question: &str) -> String {
    FallbackAnswerer::default().answer(document, question).content
}
