use std::{fs, path::Path};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::comprehension::KeywordPolicy;

/// Runtime configuration, loaded from TOML. Every field has a default.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NlpConfig {
    /// Sentence and keyword thresholds.
    #[serde(default)]
    pub matcher: MatcherSettings,
    /// Answer length caps.
    #[serde(default)]
    pub composer: ComposerSettings,
    /// Document digest parameters.
    #[serde(default)]
    pub digest: DigestSettings,
    /// Offline mind map parameters.
    #[serde(default)]
    pub mindmap: MindMapSettings,
    /// Remote text generation endpoint.
    #[serde(default)]
    pub remote: RemoteSettings,
}

impl NlpConfig {
    /// Loads and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading nlp config {}", path.display()))?;
        Self::from_toml_str(&raw).with_context(|| format!("parsing {}", path.display()))
    }

    /// Parses and validates TOML text.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would make answers empty or chunking impossible.
    pub fn validate(&self) -> Result<()> {
        if self.composer.strict_limit == 0 || self.composer.broad_limit == 0 {
            bail!("composer limits must be at least 1");
        }
        if self.matcher.broad_min_keyword_len > self.matcher.strict_min_keyword_len {
            bail!(
                "broad_min_keyword_len ({}) must not exceed strict_min_keyword_len ({})",
                self.matcher.broad_min_keyword_len,
                self.matcher.strict_min_keyword_len
            );
        }
        if self.digest.chunk_chars == 0 {
            bail!("digest.chunk_chars must be positive");
        }
        if self.mindmap.parent_fanout == 0 || self.mindmap.parent_fanout > self.mindmap.concepts {
            bail!("mindmap.parent_fanout must be between 1 and mindmap.concepts");
        }
        if !(0.0..=2.0).contains(&self.remote.temperature) {
            bail!("remote.temperature must be within 0.0..=2.0");
        }
        Ok(())
    }
}

/// Thresholds for sentence splitting and keyword extraction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatcherSettings {
    /// Sentences must be longer than this many characters.
    #[serde(default = "default_min_sentence_chars")]
    pub min_sentence_chars: usize,
    /// Strict-tier keywords must be longer than this.
    #[serde(default = "default_strict_min_keyword_len")]
    pub strict_min_keyword_len: usize,
    /// Broad-tier keywords must be longer than this.
    #[serde(default = "default_broad_min_keyword_len")]
    pub broad_min_keyword_len: usize,
}

impl MatcherSettings {
    /// Strict tier: stopwords removed.
    #[must_use]
    pub fn strict_policy(&self) -> KeywordPolicy {
        KeywordPolicy {
            min_len: self.strict_min_keyword_len,
            filter_stopwords: true,
        }
    }

    /// Broad tier: stopwords kept.
    #[must_use]
    pub fn broad_policy(&self) -> KeywordPolicy {
        KeywordPolicy {
            min_len: self.broad_min_keyword_len,
            filter_stopwords: false,
        }
    }
}

impl Default for MatcherSettings {
    fn default() -> Self {
        Self {
            min_sentence_chars: default_min_sentence_chars(),
            strict_min_keyword_len: default_strict_min_keyword_len(),
            broad_min_keyword_len: default_broad_min_keyword_len(),
        }
    }
}

/// How many matched sentences an answer quotes per tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposerSettings {
    /// Cap for strict-tier matches.
    #[serde(default = "default_strict_limit")]
    pub strict_limit: usize,
    /// Cap for broad-tier matches.
    #[serde(default = "default_broad_limit")]
    pub broad_limit: usize,
}

impl Default for ComposerSettings {
    fn default() -> Self {
        Self {
            strict_limit: default_strict_limit(),
            broad_limit: default_broad_limit(),
        }
    }
}

/// Chunking, summary and topic parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestSettings {
    /// Maximum characters per chunk.
    #[serde(default = "default_chunk_chars")]
    pub chunk_chars: usize,
    /// Minimum sentence length (exclusive) for chunking.
    #[serde(default = "default_min_sentence_chars")]
    pub chunk_min_sentence_chars: usize,
    /// Minimum sentence length (exclusive) for the summary.
    #[serde(default = "default_summary_min_sentence_chars")]
    pub summary_min_sentence_chars: usize,
    /// Sentences in the summary.
    #[serde(default = "default_summary_sentences")]
    pub summary_sentences: usize,
    /// Topic words must be longer than this.
    #[serde(default = "default_term_min_len")]
    pub topic_min_len: usize,
    /// Number of topics reported.
    #[serde(default = "default_topic_count")]
    pub topic_count: usize,
}

impl Default for DigestSettings {
    fn default() -> Self {
        Self {
            chunk_chars: default_chunk_chars(),
            chunk_min_sentence_chars: default_min_sentence_chars(),
            summary_min_sentence_chars: default_summary_min_sentence_chars(),
            summary_sentences: default_summary_sentences(),
            topic_min_len: default_term_min_len(),
            topic_count: default_topic_count(),
        }
    }
}

/// Shape of the offline mind map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MindMapSettings {
    /// Words of the document used as the root label.
    #[serde(default = "default_title_words")]
    pub title_words: usize,
    /// Terms must be longer than this.
    #[serde(default = "default_term_min_len")]
    pub term_min_len: usize,
    /// First-level nodes.
    #[serde(default = "default_concepts")]
    pub concepts: usize,
    /// Second-level nodes.
    #[serde(default = "default_sub_concepts")]
    pub sub_concepts: usize,
    /// Second-level nodes are spread over this many first-level nodes.
    #[serde(default = "default_parent_fanout")]
    pub parent_fanout: usize,
}

impl Default for MindMapSettings {
    fn default() -> Self {
        Self {
            title_words: default_title_words(),
            term_min_len: default_term_min_len(),
            concepts: default_concepts(),
            sub_concepts: default_sub_concepts(),
            parent_fanout: default_parent_fanout(),
        }
    }
}

/// OpenAI-compatible chat completion endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSettings {
    /// When false the heuristic answerer is used directly.
    #[serde(default)]
    pub enabled: bool,
    /// Chat completions URL.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Model identifier.
    #[serde(default = "default_model")]
    pub model: String,
    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    /// Completion token cap.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Sampling temperature.
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_endpoint(),
            model: default_model(),
            api_key_env: default_api_key_env(),
            max_tokens: default_max_tokens(),
            temperature: default_temperature(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

const fn default_min_sentence_chars() -> usize {
    10
}

const fn default_strict_min_keyword_len() -> usize {
    3
}

const fn default_broad_min_keyword_len() -> usize {
    1
}

const fn default_strict_limit() -> usize {
    3
}

const fn default_broad_limit() -> usize {
    2
}

const fn default_chunk_chars() -> usize {
    500
}

const fn default_summary_min_sentence_chars() -> usize {
    20
}

const fn default_summary_sentences() -> usize {
    3
}

const fn default_term_min_len() -> usize {
    4
}

const fn default_topic_count() -> usize {
    10
}

const fn default_title_words() -> usize {
    5
}

const fn default_concepts() -> usize {
    6
}

const fn default_sub_concepts() -> usize {
    6
}

const fn default_parent_fanout() -> usize {
    3
}

fn default_endpoint() -> String {
    "https://api.openai.com/v1/chat/completions".into()
}

fn default_model() -> String {
    "gpt-3.5-turbo".into()
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".into()
}

const fn default_max_tokens() -> u32 {
    500
}

const fn default_temperature() -> f32 {
    0.3
}

const fn default_timeout_secs() -> u64 {
    30
}
