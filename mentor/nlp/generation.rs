//! Boundary to remote text generators: send a prompt, receive text, or fail.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Two-part chat prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerationPrompt {
    /// Instructions for the model.
    pub system: String,
    /// Request body.
    pub user: String,
}

/// Errors emitted while calling a text generator.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// The API key variable is unset or empty.
    #[error("missing API key in environment variable {0}")]
    MissingApiKey(String),
    /// Provider throttled the request.
    #[error("rate limited by provider")]
    RateLimited,
    /// Network failure or non-success status.
    #[error("transport error: {0}")]
    Transport(String),
    /// Provider answered with an unexpected body.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// Provider answered with no text.
    #[error("empty response")]
    EmptyResponse,
}

impl GenerationError {
    /// Short label for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingApiKey(_) => "missing_api_key",
            Self::RateLimited => "rate_limited",
            Self::Transport(_) => "transport",
            Self::MalformedResponse(_) => "malformed_response",
            Self::EmptyResponse => "empty_response",
        }
    }
}

/// Remote text generation service.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Provider label for logs.
    fn name(&self) -> &str;

    /// Generates a completion for the prompt.
    async fn generate(&self, prompt: &GenerationPrompt) -> Result<String, GenerationError>;
}

/// Prompt asking a model to answer strictly from the document.
#[must_use]
pub fn build_answer_prompt(document: &str, question: &str) -> GenerationPrompt {
    GenerationPrompt {
        system: "You answer questions using only the supplied document. Be accurate and quote the document where it helps.".into(),
        user: format!(
            "Document:\n{document}\n\nQuestion: {question}\n\n\
Rules:\n\
1. Use only information found in the document.\n\
2. If the document does not answer the question, say so plainly.\n\
3. Quote or reference the relevant passages when possible.\n\
4. Keep the answer concise but complete.\n\
5. If the question is ambiguous, ask for clarification.\n\n\
Answer:"
        ),
    }
}

/// Prompt asking a model for a JSON mind map of the document.
#[must_use]
pub fn build_mind_map_prompt(document: &str) -> GenerationPrompt {
    GenerationPrompt {
        system: "You turn documents into concept hierarchies and reply with JSON only.".into(),
        user: format!(
            "Build a mind map of the document below.\n\nDocument:\n{document}\n\n\
Reply with a single JSON object of the form\n\
{{\"nodes\": [{{\"id\": \"main\", \"label\": \"Main Topic\", \"level\": 0}}, {{\"id\": \"concept_0\", \"label\": \"Concept\", \"level\": 1}}],\n \
\"edges\": [{{\"source\": \"main\", \"target\": \"concept_0\"}}]}}\n\n\
Use exactly one level-0 node, 4 to 6 level-1 concepts and 6 to 8 level-2 sub-concepts. \
Labels have at most four words. No text outside the JSON object."
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn answer_prompt_embeds_document_and_question() {
        let prompt = build_answer_prompt("Rust is fast.", "Is Rust fast?");
        assert!(prompt.user.contains("Document:\nRust is fast."));
        assert!(prompt.user.contains("Question: Is Rust fast?"));
        assert!(prompt.user.ends_with("Answer:"));
    }

    #[test]
    fn mind_map_prompt_shows_the_expected_json_shape() {
        let prompt = build_mind_map_prompt("Doc body");
        assert!(prompt.user.contains("\"nodes\": [{\"id\": \"main\""));
        assert!(prompt.user.contains("Doc body"));
    }

    #[test]
    fn error_kinds_are_stable() {
        assert_eq!(GenerationError::RateLimited.kind(), "rate_limited");
        assert_eq!(
            GenerationError::MissingApiKey("OPENAI_API_KEY".into()).to_string(),
            "missing API key in environment variable OPENAI_API_KEY"
        );
    }
}
