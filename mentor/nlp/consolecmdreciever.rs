//! Console command ingestion: one JSON command per stdin line.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{json, Value};
use shared_logging::LogLevel;
use tokio::{
    io::{AsyncBufRead, AsyncBufReadExt, BufReader},
    sync::mpsc::UnboundedSender,
};

use crate::{
    assistant::{AskRequest, DocumentAssistant},
    telemetry::NlpTelemetry,
};

/// Commands accepted from the console.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ConsoleCommand {
    /// Ask a question about inline document text.
    Ask {
        /// Question payload.
        question: String,
        /// Document text.
        #[serde(alias = "context")]
        document: String,
    },
    /// Build a digest of inline document text.
    Digest {
        /// Document text.
        document: String,
        /// Optional file name echoed in the digest.
        #[serde(default)]
        file_name: Option<String>,
    },
    /// Build a mind map of inline document text.
    MindMap {
        /// Document text.
        document: String,
    },
    /// Exit the loop.
    Quit,
}

/// Receives JSON line commands and forwards them to the runtime.
pub struct ConsoleCommandReceiver {
    sender: UnboundedSender<ConsoleCommand>,
    telemetry: Option<NlpTelemetry>,
}

impl ConsoleCommandReceiver {
    /// Creates a new receiver.
    #[must_use]
    pub fn new(sender: UnboundedSender<ConsoleCommand>, telemetry: Option<NlpTelemetry>) -> Self {
        Self { sender, telemetry }
    }

    /// Reads stdin until EOF or `quit`.
    pub async fn run(&self) -> Result<()> {
        self.run_with(BufReader::new(tokio::io::stdin())).await
    }

    /// Reads `reader` until EOF or `quit`. Blank lines are skipped; invalid
    /// lines are logged and skipped.
    pub async fn run_with<R>(&self, reader: R) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut lines = reader.lines();
        while let Some(line) = lines.next_line().await.context("reading console input")? {
            if line.trim().is_empty() {
                continue;
            }
            let cmd: ConsoleCommand = match serde_json::from_str(&line) {
                Ok(cmd) => cmd,
                Err(err) => {
                    self.log(
                        LogLevel::Warn,
                        "nlp.console.invalid_command",
                        json!({ "error": err.to_string() }),
                    );
                    continue;
                }
            };
            if matches!(cmd, ConsoleCommand::Quit) {
                break;
            }
            self.sender
                .send(cmd)
                .context("console command channel closed")?;
        }
        self.log(LogLevel::Info, "nlp.console.receiver_shutdown", json!({}));
        Ok(())
    }

    fn log(&self, level: LogLevel, message: &str, metadata: Value) {
        if let Some(tel) = &self.telemetry {
            let _ = tel.log(level, message, metadata);
        }
    }
}

/// Runs one command and renders the reply as JSON. Errors become `{"error": ...}`.
pub async fn execute_command(assistant: &DocumentAssistant, command: ConsoleCommand) -> Value {
    let rendered = match command {
        ConsoleCommand::Ask { question, document } => assistant
            .ask(&AskRequest::new(document, question))
            .await
            .map(|response| json!(response)),
        ConsoleCommand::Digest {
            document,
            file_name,
        } => assistant
            .digest(&document, file_name)
            .map(|digest| json!(digest)),
        ConsoleCommand::MindMap { document } => assistant
            .mind_map(&document)
            .await
            .map(|map| json!({ "mindMap": map })),
        ConsoleCommand::Quit => Ok(json!({ "status": "bye" })),
    };
    rendered.unwrap_or_else(|err| json!({ "error": err.to_string() }))
}
