use std::{fmt, path::PathBuf, sync::Arc};

use anyhow::Result;
use serde_json::Value;
use shared_event_bus::{EventPublisher, EventRecord};
use shared_logging::{JsonLogger, LogLevel, LogRecord};
use tokio::runtime::{Builder, Handle};
use uuid::Uuid;

/// Builder for [`NlpTelemetry`].
pub struct NlpTelemetryBuilder {
    module: String,
    log_path: Option<PathBuf>,
    min_level: LogLevel,
    event_publisher: Option<Arc<dyn EventPublisher>>,
}

impl NlpTelemetryBuilder {
    /// Creates the builder.
    #[must_use]
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            log_path: None,
            min_level: LogLevel::Debug,
            event_publisher: None,
        }
    }

    /// Sets the JSON log path.
    #[must_use]
    pub fn log_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.log_path = Some(path.into());
        self
    }

    /// Drops log records below `level`.
    #[must_use]
    pub const fn min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    /// Sets the event publisher.
    #[must_use]
    pub fn event_publisher(mut self, publisher: Arc<dyn EventPublisher>) -> Self {
        self.event_publisher = Some(publisher);
        self
    }

    /// Builds the telemetry handle, opening the log file if one was set.
    pub fn build(self) -> Result<NlpTelemetry> {
        let logger = match self.log_path {
            Some(path) => Some(JsonLogger::with_min_level(path, self.min_level)?),
            None => None,
        };
        Ok(NlpTelemetry {
            inner: Arc::new(TelemetryInner {
                module: self.module,
                logger,
                publisher: self.event_publisher,
            }),
        })
    }
}

/// Cheaply clonable telemetry handle shared by the NLP components.
#[derive(Clone)]
pub struct NlpTelemetry {
    inner: Arc<TelemetryInner>,
}

impl fmt::Debug for NlpTelemetry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NlpTelemetry")
            .field("module", &self.inner.module)
            .field("logging", &self.inner.logger.is_some())
            .field("events", &self.inner.publisher.is_some())
            .finish()
    }
}

struct TelemetryInner {
    module: String,
    logger: Option<JsonLogger>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl NlpTelemetry {
    /// Returns a builder.
    #[must_use]
    pub fn builder(module: impl Into<String>) -> NlpTelemetryBuilder {
        NlpTelemetryBuilder::new(module)
    }

    /// Logs a structured record. `metadata` fields are copied when it is a JSON object.
    pub fn log(&self, level: LogLevel, message: &str, metadata: Value) -> Result<()> {
        if let Some(logger) = &self.inner.logger {
            if logger.enabled(level) {
                let record =
                    LogRecord::new(&self.inner.module, level, message).with_metadata(metadata);
                logger.log(&record)?;
            }
        }
        Ok(())
    }

    /// Publishes an event.
    ///
    /// Inside a tokio runtime the publish is spawned; outside one it runs to
    /// completion on a temporary current-thread runtime.
    pub fn event(&self, event_type: &str, payload: Value) -> Result<()> {
        let Some(publisher) = &self.inner.publisher else {
            return Ok(());
        };
        let record = EventRecord {
            id: format!("evt-{}", Uuid::new_v4()),
            source: self.inner.module.clone(),
            event_type: event_type.into(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            payload,
        };
        if let Ok(handle) = Handle::try_current() {
            let publisher = Arc::clone(publisher);
            handle.spawn(async move {
                if let Err(err) = publisher.publish(record).await {
                    eprintln!("telemetry event publish failed: {err:?}");
                }
            });
            Ok(())
        } else {
            Builder::new_current_thread()
                .enable_all()
                .build()?
                .block_on(publisher.publish(record))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use shared_event_bus::MemoryEventBus;
    use tempfile::tempdir;

    #[test]
    fn telemetry_writes_log_and_event() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nlp.log");
        let bus = Arc::new(MemoryEventBus::new(8));
        let telemetry = NlpTelemetry::builder("nlp")
            .log_path(&path)
            .event_publisher(bus.clone())
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Info, "nlp.ask.start", json!({ "question_chars": 12 }))
            .unwrap();
        telemetry
            .event("nlp.ask.completed", json!({ "origin": "fallback" }))
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("nlp.ask.start"));
        assert!(content.contains("question_chars"));
        assert_eq!(bus.events_of("nlp.ask.completed").len(), 1);
    }

    #[test]
    fn min_level_filters_debug_records() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nlp.log");
        let telemetry = NlpTelemetry::builder("nlp")
            .log_path(&path)
            .min_level(LogLevel::Info)
            .build()
            .unwrap();
        telemetry
            .log(LogLevel::Debug, "nlp.answer.composed", json!({}))
            .unwrap();
        telemetry
            .log(LogLevel::Warn, "nlp.remote.failed", json!({}))
            .unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(!content.contains("nlp.answer.composed"));
        assert!(content.contains("nlp.remote.failed"));
    }

    #[test]
    fn sinkless_telemetry_is_a_no_op() {
        let telemetry = NlpTelemetry::builder("nlp").build().unwrap();
        telemetry.log(LogLevel::Error, "ignored", json!(null)).unwrap();
        telemetry.event("ignored", json!({})).unwrap();
        assert!(format!("{telemetry:?}").contains("logging: false"));
    }
}
