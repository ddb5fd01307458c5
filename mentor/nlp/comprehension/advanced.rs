use std::sync::Arc;

use anyhow::Result;
use futures::future::try_join_all;
use serde_json::json;
use shared_logging::LogLevel;

use crate::{
    answer::{AnswerDraft, FallbackAnswerer},
    telemetry::NlpTelemetry,
};

/// One question against one document.
#[derive(Debug, Clone)]
pub struct QuestionBundle {
    /// Document text, shared between bundles asking about the same document.
    pub document: Arc<str>,
    /// Question.
    pub question: String,
    /// Correlation id for tracing.
    pub correlation_id: String,
}

impl QuestionBundle {
    /// Creates a bundle with a fresh correlation id.
    #[must_use]
    pub fn new(document: Arc<str>, question: impl Into<String>) -> Self {
        Self {
            document,
            question: question.into(),
            correlation_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Answers many bundles concurrently on the blocking pool.
pub struct BatchAnswerController {
    answerer: FallbackAnswerer,
    telemetry: Option<NlpTelemetry>,
}

impl BatchAnswerController {
    /// Creates a new controller.
    #[must_use]
    pub fn new(answerer: FallbackAnswerer, telemetry: Option<NlpTelemetry>) -> Self {
        Self {
            answerer,
            telemetry,
        }
    }

    /// Processes a batch; results keep input order.
    pub async fn process_batch(&self, bundles: Vec<QuestionBundle>) -> Result<Vec<AnswerDraft>> {
        self.log("nlp.batch.start", bundles.len());
        let tasks = bundles.into_iter().map(|bundle| {
            let answerer = self.answerer.clone();
            let tel = self.telemetry.clone();
            tokio::task::spawn_blocking(move || {
                if let Some(t) = tel {
                    let _ = t.log(
                        LogLevel::Debug,
                        "nlp.batch.question",
                        json!({ "correlation_id": bundle.correlation_id }),
                    );
                }
                answerer.answer(&bundle.document, &bundle.question)
            })
        });
        let results = try_join_all(tasks).await?;
        self.log("nlp.batch.complete", results.len());
        Ok(results)
    }

    fn log(&self, message: &str, count: usize) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(LogLevel::Info, message, json!({ "count": count }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::answer::AnswerSource;
    use crate::comprehension::MatchTier;

    #[tokio::test]
    async fn batch_preserves_order_and_matches_sequential_answers() {
        let answerer = FallbackAnswerer::default();
        let controller = BatchAnswerController::new(answerer.clone(), None);
        let document: Arc<str> = Arc::from("The cat sat on the mat. Dogs are loyal animals.");
        let questions = ["What do dogs do?", "Where is the cat?", "When was it?"];
        let bundles = questions
            .iter()
            .map(|q| QuestionBundle::new(Arc::clone(&document), *q))
            .collect();
        let drafts = controller.process_batch(bundles).await.unwrap();
        assert_eq!(drafts.len(), 3);
        for (draft, question) in drafts.iter().zip(questions) {
            assert_eq!(draft, &answerer.answer(&document, question));
        }
        assert_eq!(drafts[0].source, AnswerSource::Matched(MatchTier::Strict));
    }

    #[tokio::test]
    async fn empty_batch_is_fine() {
        let controller = BatchAnswerController::new(FallbackAnswerer::default(), None);
        assert!(controller.process_batch(Vec::new()).await.unwrap().is_empty());
    }
}
