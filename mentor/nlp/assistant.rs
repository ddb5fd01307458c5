//! Request-level entry points: ask, digest, mind map.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::json;
use shared_logging::LogLevel;
use thiserror::Error;

use crate::{
    answer::{AnswerDraft, FallbackAnswerer},
    comprehension::{BatchAnswerController, QuestionBundle},
    config::NlpConfig,
    digest::DocumentDigest,
    generation::{build_answer_prompt, build_mind_map_prompt, GenerationError, TextGenerator},
    mindmap::{basic_mind_map, MindMap},
    telemetry::NlpTelemetry,
};

/// Question about a document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    /// Extracted document text.
    #[serde(alias = "pdfText", alias = "documentText")]
    pub document_text: String,
    /// Natural-language question.
    pub question: String,
}

impl AskRequest {
    /// Creates a request.
    #[must_use]
    pub fn new(document_text: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            document_text: document_text.into(),
            question: question.into(),
        }
    }
}

/// Which path produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerOrigin {
    /// Remote text generator.
    Remote,
    /// Heuristic answerer.
    Fallback,
}

/// Answer returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    /// Answer text.
    pub answer: String,
    /// Producing path.
    pub origin: AnswerOrigin,
}

/// Errors emitted by [`DocumentAssistant`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AskError {
    /// A required field was blank.
    #[error("{0} is required")]
    MissingInput(&'static str),
}

/// Answers questions, builds digests and mind maps for document text.
///
/// The remote generator, when present, is tried first; its failure is logged
/// and answered locally. The local fallback only starts after the remote
/// call has completed.
#[derive(Clone)]
pub struct DocumentAssistant {
    config: NlpConfig,
    answerer: FallbackAnswerer,
    generator: Option<Arc<dyn TextGenerator>>,
    telemetry: Option<NlpTelemetry>,
}

impl std::fmt::Debug for DocumentAssistant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DocumentAssistant")
            .field("generator", &self.generator.as_ref().map(|g| g.name().to_string()))
            .field("telemetry", &self.telemetry)
            .finish_non_exhaustive()
    }
}

impl DocumentAssistant {
    /// Creates an assistant without a remote generator.
    #[must_use]
    pub fn new(config: NlpConfig) -> Self {
        let answerer = FallbackAnswerer::new(&config.matcher, config.composer, None);
        Self {
            config,
            answerer,
            generator: None,
            telemetry: None,
        }
    }

    /// Attaches a remote generator.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn TextGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Attaches telemetry sinks.
    #[must_use]
    pub fn with_telemetry(mut self, telemetry: NlpTelemetry) -> Self {
        self.answerer = FallbackAnswerer::new(
            &self.config.matcher,
            self.config.composer,
            Some(telemetry.clone()),
        );
        self.telemetry = Some(telemetry);
        self
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &NlpConfig {
        &self.config
    }

    /// Whether a remote generator is attached.
    #[must_use]
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// Heuristic answerer used for fallbacks.
    #[must_use]
    pub fn answerer(&self) -> &FallbackAnswerer {
        &self.answerer
    }

    /// Answers a question about the document.
    pub async fn ask(&self, request: &AskRequest) -> Result<AskResponse, AskError> {
        validate_inputs(&request.document_text, [request.question.as_str()])?;
        self.log(
            LogLevel::Info,
            "nlp.ask.start",
            json!({
                "document_chars": request.document_text.chars().count(),
                "question": request.question,
            }),
        );

        let response = match self.try_remote_answer(request).await {
            Some(answer) => AskResponse {
                answer,
                origin: AnswerOrigin::Remote,
            },
            None => {
                let draft = self.answerer.answer(&request.document_text, &request.question);
                self.log_fallback(&draft);
                AskResponse {
                    answer: draft.content,
                    origin: AnswerOrigin::Fallback,
                }
            }
        };
        self.emit_completed(&response);
        Ok(response)
    }

    /// Answers several questions about one document, in input order.
    ///
    /// Every question is validated before any is answered. Without a
    /// generator the questions are answered concurrently on the blocking
    /// pool; with one they are asked one at a time.
    pub async fn ask_many(
        &self,
        document_text: &str,
        questions: &[String],
    ) -> anyhow::Result<Vec<AskResponse>> {
        validate_inputs(document_text, questions.iter().map(String::as_str))?;
        if self.generator.is_some() {
            let mut responses = Vec::with_capacity(questions.len());
            for question in questions {
                responses.push(self.ask(&AskRequest::new(document_text, question.as_str())).await?);
            }
            return Ok(responses);
        }
        let shared: Arc<str> = Arc::from(document_text);
        let bundles = questions
            .iter()
            .map(|question| QuestionBundle::new(Arc::clone(&shared), question.as_str()))
            .collect();
        let controller = BatchAnswerController::new(self.answerer.clone(), self.telemetry.clone());
        let drafts = controller.process_batch(bundles).await?;
        Ok(drafts
            .into_iter()
            .map(|draft| {
                self.log_fallback(&draft);
                let response = AskResponse {
                    answer: draft.content,
                    origin: AnswerOrigin::Fallback,
                };
                self.emit_completed(&response);
                response
            })
            .collect())
    }

    async fn try_remote_answer(&self, request: &AskRequest) -> Option<String> {
        let generator = self.generator.as_ref()?;
        let prompt = build_answer_prompt(&request.document_text, &request.question);
        match generator.generate(&prompt).await {
            Ok(answer) if !answer.trim().is_empty() => Some(answer),
            Ok(_) => {
                self.log_remote_failure(generator.name(), &GenerationError::EmptyResponse);
                None
            }
            Err(err) => {
                self.log_remote_failure(generator.name(), &err);
                None
            }
        }
    }

    /// Builds chunks, summary and topics for the document.
    pub fn digest(
        &self,
        text: &str,
        file_name: Option<String>,
    ) -> Result<DocumentDigest, AskError> {
        if text.trim().is_empty() {
            return Err(AskError::MissingInput("document text"));
        }
        let digest = DocumentDigest::build(text, file_name, &self.config.digest);
        self.log(
            LogLevel::Info,
            "nlp.digest.built",
            json!({
                "file_id": digest.file_id,
                "chunks": digest.chunks.len(),
                "topics": digest.topics.len(),
            }),
        );
        Ok(digest)
    }

    /// Asks the generator for a mind map, falling back to the frequency-based one.
    pub async fn mind_map(&self, text: &str) -> Result<MindMap, AskError> {
        if text.trim().is_empty() {
            return Err(AskError::MissingInput("document text"));
        }
        if let Some(generator) = &self.generator {
            let prompt = build_mind_map_prompt(text);
            match generator.generate(&prompt).await {
                Ok(reply) => match MindMap::from_model_reply(&reply) {
                    Ok(map) if map.is_well_formed() => return Ok(map),
                    Ok(_) => self.log_remote_failure(
                        generator.name(),
                        &GenerationError::MalformedResponse("mind map is not well formed".into()),
                    ),
                    Err(err) => self.log_remote_failure(
                        generator.name(),
                        &GenerationError::MalformedResponse(err.to_string()),
                    ),
                },
                Err(err) => self.log_remote_failure(generator.name(), &err),
            }
        }
        let map = basic_mind_map(text, &self.config.mindmap);
        self.log(
            LogLevel::Info,
            "nlp.mind_map.fallback",
            json!({ "nodes": map.nodes.len(), "edges": map.edges.len() }),
        );
        Ok(map)
    }

    fn emit_completed(&self, response: &AskResponse) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.event(
                "nlp.ask.completed",
                json!({ "origin": response.origin, "answer_chars": response.answer.len() }),
            );
        }
    }

    fn log_fallback(&self, draft: &AnswerDraft) {
        self.log(
            LogLevel::Info,
            "nlp.answer.fallback",
            json!({
                "source": draft.source.label(),
                "sentences_used": draft.sentences_used,
            }),
        );
    }

    fn log_remote_failure(&self, provider: &str, err: &GenerationError) {
        self.log(
            LogLevel::Warn,
            "nlp.remote.failed",
            json!({ "provider": provider, "kind": err.kind(), "error": err.to_string() }),
        );
    }

    fn log(&self, level: LogLevel, message: &str, metadata: serde_json::Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}

fn validate_inputs<'a>(
    document_text: &str,
    questions: impl IntoIterator<Item = &'a str>,
) -> Result<(), AskError> {
    if document_text.trim().is_empty() {
        return Err(AskError::MissingInput("document text"));
    }
    if questions.into_iter().any(|question| question.trim().is_empty()) {
        return Err(AskError::MissingInput("question"));
    }
    Ok(())
}

impl Default for DocumentAssistant {
    fn default() -> Self {
        Self::new(NlpConfig::default())
    }
}
