use std::{
    fs,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use mentor_nlp::{
    execute_command, ConsoleCommandReceiver, DocumentAssistant, NlpConfig, NlpTelemetry,
    OpenAiChatGenerator,
};
use serde_json::json;
use shared_event_bus::FileEventPublisher;
use shared_logging::LogLevel;
use tokio::{runtime::Runtime, sync::mpsc};

#[derive(Parser, Debug)]
#[command(name = "docqa", version, about = "Ask questions about a plain-text document")]
struct Cli {
    #[command(flatten)]
    common: CommonArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug)]
struct CommonArgs {
    /// TOML configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// JSON-lines log file.
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,
    /// Minimum log level (debug, info, warn, error).
    #[arg(long, global = true, default_value = "info")]
    log_level: String,
    /// JSON-lines event log.
    #[arg(long, global = true)]
    event_log: Option<PathBuf>,
    /// Never call the remote generator.
    #[arg(long, global = true)]
    offline: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Answers one or more questions about a document.
    Ask {
        /// Text file holding the document.
        #[arg(long)]
        document: PathBuf,
        /// Question; repeat for several.
        #[arg(long = "question", short = 'q', required = true)]
        questions: Vec<String>,
    },
    /// Prints chunks, summary and topics of a document.
    Digest {
        /// Text file holding the document.
        #[arg(long)]
        document: PathBuf,
        /// Name reported in the digest; defaults to the file name.
        #[arg(long)]
        file_name: Option<String>,
    },
    /// Prints a concept mind map of a document.
    MindMap {
        /// Text file holding the document.
        #[arg(long)]
        document: PathBuf,
    },
    /// Reads JSON commands from stdin, one per line.
    Console,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let runtime = Runtime::new()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let telemetry = build_telemetry(&cli.common)?;
    let assistant = build_assistant(&cli.common, telemetry.clone())?;
    match cli.command {
        Commands::Ask {
            document,
            questions,
        } => handle_ask(&assistant, &document, questions).await,
        Commands::Digest {
            document,
            file_name,
        } => {
            let text = load_document(&document)?;
            let file_name = file_name.or_else(|| {
                document
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
            });
            let digest = assistant.digest(&text, file_name)?;
            println!("{}", serde_json::to_string_pretty(&digest)?);
            Ok(())
        }
        Commands::MindMap { document } => {
            let text = load_document(&document)?;
            let map = assistant.mind_map(&text).await?;
            println!("{}", serde_json::to_string_pretty(&json!({ "mindMap": map }))?);
            Ok(())
        }
        Commands::Console => handle_console(&assistant, telemetry).await,
    }
}

fn build_telemetry(common: &CommonArgs) -> Result<NlpTelemetry> {
    let level = LogLevel::parse(&common.log_level)
        .ok_or_else(|| anyhow!("unknown log level {:?}", common.log_level))?;
    let mut builder = NlpTelemetry::builder("docqa").min_level(level);
    if let Some(path) = &common.log_file {
        builder = builder.log_path(path);
    }
    if let Some(path) = &common.event_log {
        builder = builder.event_publisher(Arc::new(FileEventPublisher::new(path)?));
    }
    builder.build()
}

fn build_assistant(common: &CommonArgs, telemetry: NlpTelemetry) -> Result<DocumentAssistant> {
    let config = match &common.config {
        Some(path) => NlpConfig::load(path)?,
        None => NlpConfig::default(),
    };
    let remote = config.remote.clone();
    let mut assistant = DocumentAssistant::new(config).with_telemetry(telemetry.clone());
    if common.offline || !remote.enabled {
        return Ok(assistant);
    }
    match OpenAiChatGenerator::from_env(remote) {
        Ok(generator) => assistant = assistant.with_generator(Arc::new(generator)),
        Err(err) => {
            eprintln!("remote generator unavailable ({err}); answering offline");
            let _ = telemetry.log(
                LogLevel::Warn,
                "docqa.remote.unavailable",
                json!({ "error": err.to_string() }),
            );
        }
    }
    Ok(assistant)
}

fn load_document(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("reading document {}", path.display()))
}

async fn handle_ask(
    assistant: &DocumentAssistant,
    document: &Path,
    questions: Vec<String>,
) -> Result<()> {
    let text = load_document(document)?;
    let responses = assistant.ask_many(&text, &questions).await?;
    let mut replies: Vec<_> = questions
        .into_iter()
        .zip(responses)
        .map(|(question, response)| {
            json!({
                "question": question,
                "answer": response.answer,
                "origin": response.origin,
            })
        })
        .collect();
    let output = if replies.len() == 1 {
        replies.remove(0)
    } else {
        json!(replies)
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

async fn handle_console(assistant: &DocumentAssistant, telemetry: NlpTelemetry) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let receiver = ConsoleCommandReceiver::new(tx, Some(telemetry));
    let reader = tokio::spawn(async move { receiver.run().await });
    while let Some(command) = rx.recv().await {
        let reply = execute_command(assistant, command).await;
        println!("{reply}");
    }
    reader.await?
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use mentor_nlp::AskError;
    use tempfile::tempdir;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn ask_accepts_repeated_questions_and_global_flags() {
        let cli = Cli::try_parse_from([
            "docqa",
            "ask",
            "--document",
            "notes.txt",
            "-q",
            "What is it?",
            "--question",
            "When?",
            "--offline",
        ])
        .unwrap();
        assert!(cli.common.offline);
        match cli.command {
            Commands::Ask { questions, .. } => assert_eq!(questions, vec!["What is it?", "When?"]),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn ask_requires_a_question() {
        assert!(Cli::try_parse_from(["docqa", "ask", "--document", "notes.txt"]).is_err());
    }

    #[test]
    fn missing_document_is_reported_with_path() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("absent.txt");
        let err = load_document(&missing).unwrap_err();
        assert!(format!("{err:#}").contains("absent.txt"));
    }

    #[test]
    fn offline_flag_skips_remote_setup() {
        let dir = tempdir().unwrap();
        let config = dir.path().join("nlp.toml");
        fs::write(&config, "[remote]\nenabled = true\n").unwrap();
        let common = CommonArgs {
            config: Some(config),
            log_file: None,
            log_level: "info".into(),
            event_log: None,
            offline: true,
        };
        let telemetry = build_telemetry(&common).unwrap();
        let assistant = build_assistant(&common, telemetry).unwrap();
        assert!(!assistant.has_generator());
        assert!(assistant.config().remote.enabled);
    }

    #[tokio::test]
    async fn blank_question_is_rejected_alone_and_in_a_batch() {
        let dir = tempdir().unwrap();
        let document = dir.path().join("pets.txt");
        fs::write(&document, "The cat sat on the mat. Dogs are loyal animals.").unwrap();
        let doc = document.to_str().unwrap();
        let single = Cli::try_parse_from(["docqa", "ask", "--document", doc, "-q", "  ", "--offline"])
            .unwrap();
        let batch = Cli::try_parse_from([
            "docqa",
            "ask",
            "--document",
            doc,
            "-q",
            "  ",
            "-q",
            "What do dogs do?",
            "--offline",
        ])
        .unwrap();
        for cli in [single, batch] {
            let err = run(cli).await.unwrap_err();
            assert_eq!(
                err.downcast_ref::<AskError>(),
                Some(&AskError::MissingInput("question"))
            );
        }
    }

    #[tokio::test]
    async fn offline_batch_answers_every_question() {
        let dir = tempdir().unwrap();
        let document = dir.path().join("pets.txt");
        fs::write(&document, "The cat sat on the mat. Dogs are loyal animals.").unwrap();
        let cli = Cli::try_parse_from([
            "docqa",
            "ask",
            "--document",
            document.to_str().unwrap(),
            "-q",
            "What do dogs do?",
            "-q",
            "Where is the cat?",
            "--offline",
        ])
        .unwrap();
        run(cli).await.unwrap();
    }

    #[test]
    fn unknown_log_level_is_rejected() {
        let common = CommonArgs {
            config: None,
            log_file: None,
            log_level: "chatty".into(),
            event_log: None,
            offline: false,
        };
        assert!(build_telemetry(&common).is_err());
    }
}
