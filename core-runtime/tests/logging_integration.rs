//! Global logging setup, observed through a host sink.

use async_trait::async_trait;
use bridge_traits::error::Result as SinkResult;
use bridge_traits::host_log::{LogEntry, LogLevel, LoggerSink};
use core_runtime::logging::{
    coarsen_coordinate, init_logging, redact_if_sensitive, LogFormat, LoggingConfig,
    NATIVE_LOG_TARGET,
};
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct RecordingSink {
    entries: Mutex<Vec<LogEntry>>,
}

impl RecordingSink {
    fn find(&self, message: &str) -> Option<LogEntry> {
        self.entries
            .lock()
            .unwrap()
            .iter()
            .find(|entry| entry.message == message)
            .cloned()
    }
}

#[async_trait]
impl LoggerSink for RecordingSink {
    async fn log(&self, entry: LogEntry) -> SinkResult<()> {
        self.entries.lock().unwrap().push(entry);
        Ok(())
    }

    fn min_level(&self) -> LogLevel {
        LogLevel::Debug
    }
}

#[test]
fn test_global_subscriber_filters_and_forwards() {
    // Only one global subscriber per process, so every global check lives here.
    let sink = Arc::new(RecordingSink::default());
    let config = LoggingConfig::default()
        .with_format(LogFormat::Compact)
        .with_level(LogLevel::Debug)
        .with_logger_sink(sink.clone());

    init_logging(config.clone()).unwrap();

    tracing::info!(target: "core_service", publishable_key = "prj_test_pk_1", "initialize");
    tracing::debug!(target: NATIVE_LOG_TARGET, "Tracking started");
    tracing::info!(target: "hyper", "outside the bridge");

    let initialize = sink.find("initialize").expect("bridge event forwarded");
    assert_eq!(initialize.field("publishable_key"), Some("[REDACTED]"));

    let native = sink.find("Tracking started").expect("native line forwarded");
    assert_eq!(native.target, NATIVE_LOG_TARGET);
    assert_eq!(native.level, LogLevel::Debug);

    assert!(sink.find("outside the bridge").is_none());

    assert!(init_logging(config).is_err());
}

#[test]
fn test_redaction_helpers() {
    assert_eq!(redact_if_sensitive("publishableKey", "prj_live_pk_abc"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("password", "hunter2"), "[REDACTED]");
    assert_eq!(redact_if_sensitive("external_id", "trip-42"), "trip-42");

    let email = redact_if_sensitive("description", "driver@example.com");
    assert!(email.starts_with('d'));
    assert!(!email.contains("example.com"));

    assert_eq!(coarsen_coordinate(37.774_929), 37.77);
    assert_eq!(coarsen_coordinate(-122.419_416), -122.42);
    assert_eq!(coarsen_coordinate(0.0), 0.0);
}

#[test]
fn test_config_defaults_and_chaining() {
    let defaults = LoggingConfig::default();
    assert_eq!(defaults.level, LogLevel::Info);
    assert_eq!(defaults.native_logs, Some(LogLevel::Debug));
    assert!(defaults.redact_pii);
    #[cfg(debug_assertions)]
    assert_eq!(defaults.format, LogFormat::Pretty);

    let config = LoggingConfig::default()
        .with_format(LogFormat::Json)
        .with_level(LogLevel::Warn)
        .with_native_logs(None)
        .with_pii_redaction(false)
        .with_spans(false)
        .with_target(false)
        .with_thread_info(true)
        .with_filter("core_service=debug");

    assert_eq!(config.format, LogFormat::Json);
    assert_eq!(config.level, LogLevel::Warn);
    assert_eq!(config.native_logs, None);
    assert!(!config.redact_pii);
    assert!(!config.enable_spans);
    assert!(!config.display_target);
    assert!(config.display_thread_info);
    assert_eq!(config.filter.as_deref(), Some("core_service=debug"));
}
