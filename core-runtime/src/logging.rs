//! # Logging
//!
//! `tracing` setup for the bridge and its host.
//!
//! Three things flow through here:
//! - the bridge's own diagnostics (`core_service`, `core_runtime`, ...),
//!   filtered at [`LoggingConfig::level`];
//! - lines the native SDK pushes through its delegate, re-emitted under
//!   [`NATIVE_LOG_TARGET`] with their own threshold;
//! - an optional copy of every surviving event for the host's logger
//!   ([`LoggerSink`]), with credentials redacted and coordinates coarsened.
//!
//! ```ignore
//! use bridge_traits::host_log::{ConsoleLogger, LogLevel};
//! use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
//! use std::sync::Arc;
//!
//! let config = LoggingConfig::default()
//!     .with_format(LogFormat::Compact)
//!     .with_level(LogLevel::Debug)
//!     .with_native_logs(Some(LogLevel::Debug))
//!     .with_logger_sink(Arc::new(ConsoleLogger::default()));
//! init_logging(config).expect("Failed to initialize logging");
//! ```
//!
//! Code that logs user data should still mask it at the call site:
//!
//! ```ignore
//! tracing::debug!(
//!     publishable_key = %redact_if_sensitive("publishable_key", key),
//!     latitude = coarsen_coordinate(lat),
//!     "Initializing"
//! );
//! ```

use crate::error::{Error, Result};

use bridge_traits::host_log::{LogEntry, LogLevel, LoggerSink};

use std::fmt;
use std::io;
use std::sync::Arc;

use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    filter::EnvFilter,
    fmt::format::FmtSpan,
    layer::{Context, SubscriberExt},
    registry::LookupSpan,
    util::SubscriberInitExt,
    Layer,
};

/// Target under which native SDK log lines are re-emitted.
pub const NATIVE_LOG_TARGET: &str = "location_bridge::native";

/// Crates that follow [`LoggingConfig::level`] under the default filter.
const BRIDGE_CRATES: &[&str] = &[
    "location_bridge",
    "core_runtime",
    "core_service",
    "core_schema",
    "bridge_sim",
    "bridge_traits",
];

/// Field-name fragments whose values are credentials.
const CREDENTIAL_FIELDS: &[&str] = &[
    "token",
    "publishable",
    "api_key",
    "apikey",
    "password",
    "secret",
    "authorization",
    "bearer",
];

/// Field names whose numeric values are coordinates.
const COORDINATE_FIELDS: &[&str] = &["latitude", "longitude", "lat", "lng", "lon"];

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Multi-line, coloured; for desktop runs.
    Pretty,
    /// One JSON object per line; for log shippers.
    Json,
    Compact,
}

impl Default for LogFormat {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            Self::Pretty
        } else {
            Self::Json
        }
    }
}

#[derive(Clone)]
pub struct LoggingConfig {
    pub format: LogFormat,
    /// Level for the bridge crates.
    pub level: LogLevel,
    /// Threshold for re-emitted native SDK lines; `None` silences them.
    pub native_logs: Option<LogLevel>,
    /// Mask credentials and coarsen coordinates before the host sink.
    pub redact_pii: bool,
    /// Full `EnvFilter` directive string; replaces the level-based filter.
    pub filter: Option<String>,
    pub logger_sink: Option<Arc<dyn LoggerSink>>,
    /// Log span activity (the per-command spans from `#[instrument]`).
    pub enable_spans: bool,
    pub display_target: bool,
    pub display_thread_info: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: LogLevel::Info,
            native_logs: Some(LogLevel::Debug),
            redact_pii: true,
            filter: None,
            logger_sink: None,
            enable_spans: true,
            display_target: true,
            display_thread_info: false,
        }
    }
}

impl fmt::Debug for LoggingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoggingConfig")
            .field("format", &self.format)
            .field("level", &self.level)
            .field("native_logs", &self.native_logs)
            .field("redact_pii", &self.redact_pii)
            .field("filter", &self.filter)
            .field("logger_sink", &self.logger_sink.is_some())
            .finish()
    }
}

impl LoggingConfig {
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_native_logs(mut self, level: Option<LogLevel>) -> Self {
        self.native_logs = level;
        self
    }

    pub fn with_pii_redaction(mut self, redact: bool) -> Self {
        self.redact_pii = redact;
        self
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    pub fn with_logger_sink(mut self, sink: Arc<dyn LoggerSink>) -> Self {
        self.logger_sink = Some(sink);
        self
    }

    pub fn with_spans(mut self, enable: bool) -> Self {
        self.enable_spans = enable;
        self
    }

    pub fn with_target(mut self, display: bool) -> Self {
        self.display_target = display;
        self
    }

    pub fn with_thread_info(mut self, display: bool) -> Self {
        self.display_thread_info = display;
        self
    }
}

/// Installs the global subscriber.
///
/// Call once at host startup; a second call fails with [`Error::Config`].
pub fn init_logging(config: LoggingConfig) -> Result<()> {
    let filter = build_filter(&config)?;
    let sink_layer = config
        .logger_sink
        .clone()
        .map(|sink| HostSinkLayer::new(sink, config.redact_pii));
    let registry = tracing_subscriber::registry().with(filter).with(sink_layer);

    let span_events = if config.enable_spans {
        FmtSpan::ACTIVE
    } else {
        FmtSpan::NONE
    };

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .pretty()
                    .with_target(config.display_target)
                    .with_thread_ids(config.display_thread_info)
                    .with_thread_names(config.display_thread_info)
                    .with_span_events(span_events)
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(config.enable_spans)
                    .with_span_list(false)
                    .with_target(config.display_target)
                    .with_thread_ids(config.display_thread_info)
                    .with_writer(io::stderr),
            )
            .try_init(),
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_target(config.display_target)
                    .with_thread_ids(config.display_thread_info)
                    .with_writer(io::stderr),
            )
            .try_init(),
    };

    result.map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))
}

/// Default filter: everything at warn, the bridge crates at the configured
/// level, native SDK lines at their own threshold.
fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let directives = match &config.filter {
        Some(custom) => custom.clone(),
        None => {
            let level = config.level.as_str();
            let native = config.native_logs.map_or("off", LogLevel::as_str);
            std::iter::once("warn".to_string())
                .chain(BRIDGE_CRATES.iter().map(|krate| format!("{krate}={level}")))
                .chain(std::iter::once(format!("{NATIVE_LOG_TARGET}={native}")))
                .collect::<Vec<_>>()
                .join(",")
        }
    };

    EnvFilter::try_new(&directives)
        .map_err(|e| Error::Config(format!("Invalid log filter '{}': {}", directives, e)))
}

/// Copies each event into a [`LogEntry`] for the host's [`LoggerSink`].
struct HostSinkLayer {
    sink: Arc<dyn LoggerSink>,
    redact: bool,
}

impl HostSinkLayer {
    fn new(sink: Arc<dyn LoggerSink>, redact: bool) -> Self {
        Self { sink, redact }
    }

    fn deliver(&self, entry: LogEntry) {
        let sink = Arc::clone(&self.sink);
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(err) = sink.log(entry).await {
                        eprintln!("LoggerSink error: {}", err);
                    }
                });
            }
            Err(_) => {
                if let Err(err) = futures::executor::block_on(sink.log(entry)) {
                    eprintln!("LoggerSink error: {}", err);
                }
            }
        }
    }
}

impl<S> Layer<S> for HostSinkLayer
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fn on_event(&self, event: &Event<'_>, ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let level = log_level(*metadata.level());
        if level < self.sink.min_level() {
            return;
        }

        let mut visitor = EntryVisitor::default();
        event.record(&mut visitor);

        let message = visitor
            .message
            .unwrap_or_else(|| metadata.name().to_string());
        let mut entry = LogEntry::new(level, metadata.target(), message);
        for (key, value) in visitor.fields {
            let value = if self.redact {
                redact_field(&key, value)
            } else {
                value
            };
            entry = entry.with_field(key, value);
        }
        if let Some(span) = ctx.lookup_current() {
            entry = entry.in_span(span.name());
        }

        self.deliver(entry);
    }
}

#[derive(Default)]
struct EntryVisitor {
    message: Option<String>,
    fields: Vec<(String, String)>,
}

impl EntryVisitor {
    fn push(&mut self, field: &Field, value: String) {
        match field.name() {
            "message" => self.message = Some(value),
            name => self.fields.push((name.to_string(), value)),
        }
    }
}

impl Visit for EntryVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.push(field, value.to_string());
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.push(field, value.to_string());
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.push(field, value.to_string());
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.push(field, value.to_string());
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.push(field, value.to_string());
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.push(field, value.to_string());
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        self.push(field, format!("{:?}", value));
    }
}

fn log_level(level: tracing::Level) -> LogLevel {
    match level {
        tracing::Level::TRACE => LogLevel::Trace,
        tracing::Level::DEBUG => LogLevel::Debug,
        tracing::Level::INFO => LogLevel::Info,
        tracing::Level::WARN => LogLevel::Warn,
        tracing::Level::ERROR => LogLevel::Error,
    }
}

/// Sink-side masking: credentials, precise coordinates, email addresses.
fn redact_field(name: &str, value: String) -> String {
    if is_coordinate_field(name) {
        if let Ok(coordinate) = value.parse::<f64>() {
            return coarsen_coordinate(coordinate).to_string();
        }
    }
    redact_if_sensitive(name, &value)
}

fn is_coordinate_field(name: &str) -> bool {
    let name = name.to_ascii_lowercase();
    COORDINATE_FIELDS.iter().any(|field| name == *field)
}

/// Masks a value whose field name marks it as a credential (publishable
/// keys, verification tokens, secrets) and email-looking values.
///
/// ```ignore
/// tracing::info!(token = %redact_if_sensitive("token", &jwt), "Token updated");
/// ```
pub fn redact_if_sensitive(field_name: &str, value: &str) -> String {
    let field = field_name.to_lowercase();
    if CREDENTIAL_FIELDS.iter().any(|fragment| field.contains(fragment)) {
        return REDACTED.to_string();
    }
    match value.split_once('@') {
        Some((local, domain)) if domain.contains('.') => {
            let first: String = local.chars().take(1).collect();
            format!("{first}***@{REDACTED}")
        }
        _ => value.to_string(),
    }
}

/// Rounds a latitude or longitude to two decimals, roughly a kilometre.
pub fn coarsen_coordinate(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bridge_traits::error::Result as SinkResult;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingSink {
        entries: Mutex<Vec<LogEntry>>,
    }

    #[async_trait]
    impl LoggerSink for CapturingSink {
        async fn log(&self, entry: LogEntry) -> SinkResult<()> {
            self.entries.lock().unwrap().push(entry);
            Ok(())
        }

        fn min_level(&self) -> LogLevel {
            LogLevel::Debug
        }
    }

    fn capture(redact: bool, emit: impl FnOnce()) -> Vec<LogEntry> {
        let sink = Arc::new(CapturingSink::default());
        let layer = HostSinkLayer::new(sink.clone(), redact);
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, emit);
        let entries = sink.entries.lock().unwrap().clone();
        entries
    }

    #[test]
    fn test_default_filter_directives() {
        let config = LoggingConfig::default().with_level(LogLevel::Debug);
        let rendered = build_filter(&config).unwrap().to_string();
        assert!(rendered.contains("core_service=debug"));
        assert!(rendered.contains("bridge_sim=debug"));
        assert!(rendered.contains("location_bridge::native=debug"));
    }

    #[test]
    fn test_native_logs_can_be_silenced() {
        let config = LoggingConfig::default().with_native_logs(None);
        let rendered = build_filter(&config).unwrap().to_string();
        assert!(rendered.contains("location_bridge::native=off"));
        assert!(rendered.contains("core_runtime=info"));
    }

    #[test]
    fn test_custom_filter_replaces_defaults() {
        let config = LoggingConfig::default().with_filter("core_service=trace");
        let rendered = build_filter(&config).unwrap().to_string();
        assert!(rendered.contains("core_service=trace"));
        assert!(!rendered.contains("bridge_sim"));
    }

    #[test]
    fn test_invalid_filter_is_config_error() {
        let config = LoggingConfig::default().with_filter("core_service=[");
        assert!(matches!(build_filter(&config), Err(Error::Config(_))));
    }

    #[test]
    fn test_sink_receives_event_with_span() {
        let entries = capture(false, || {
            let span = tracing::info_span!("start_trip");
            let _entered = span.enter();
            tracing::info!(target: "core_service::bridge", external_id = "t1", "Trip started");
        });

        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry.target, "core_service::bridge");
        assert_eq!(entry.message, "Trip started");
        assert_eq!(entry.field("external_id"), Some("t1"));
        assert_eq!(entry.span.as_deref(), Some("start_trip"));
    }

    #[test]
    fn test_sink_masks_credentials_and_coordinates() {
        let entries = capture(true, || {
            tracing::info!(
                publishable_key = "prj_live_pk_123",
                latitude = 40.783_826,
                longitude = -73.975_363,
                "initialize"
            );
        });

        let entry = &entries[0];
        assert_eq!(entry.field("publishable_key"), Some(REDACTED));
        assert_eq!(entry.field("latitude"), Some("40.78"));
        assert_eq!(entry.field("longitude"), Some("-73.98"));
    }

    #[test]
    fn test_sink_min_level_applies() {
        let entries = capture(true, || {
            tracing::trace!("too chatty");
            tracing::debug!("kept");
        });
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "kept");
    }

    #[test]
    fn test_redact_if_sensitive() {
        assert_eq!(redact_if_sensitive("publishable_key", "prj_test_pk_0000"), REDACTED);
        assert_eq!(redact_if_sensitive("verifiedToken", "abc"), REDACTED);
        assert_eq!(
            redact_if_sensitive("description", "user@example.com"),
            "u***@[REDACTED]"
        );
        assert_eq!(redact_if_sensitive("handle", "@home"), "@home");
        assert_eq!(redact_if_sensitive("operation", "startTrip"), "startTrip");
    }

    #[test]
    fn test_coordinate_field_names() {
        assert!(is_coordinate_field("Latitude"));
        assert!(is_coordinate_field("lng"));
        assert!(!is_coordinate_field("latitude_accuracy"));
        assert_eq!(redact_field("lat", "not a number".to_string()), "not a number");
    }
}
