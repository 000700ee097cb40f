//! Ready-to-use telemetry: configured logger plus persisted entries

use crate::config::{ConfigSource, EnvSource, TelemetryConfig};
use crate::core::{ExitStrategy, Logger, OutputFormat, Result};
use crate::sinks::{AsyncSink, DocumentStore, StoreSink};
use std::sync::Arc;

/// A logger wired to the console and, through an asynchronous writer, to a
/// document store.
///
/// ```no_run
/// use telemetry_log::Telemetry;
///
/// let telemetry = Telemetry::builder().json_formatter().build().unwrap();
/// let err = std::io::Error::new(std::io::ErrorKind::Other, "Internal server error");
/// telemetry.log().with_trace(&err).error("internal error", &[]);
/// ```
pub struct Telemetry {
    config: TelemetryConfig,
    log: Logger,
    store: Arc<dyn DocumentStore>,
}

impl Telemetry {
    /// Telemetry configured from the process environment
    pub fn new() -> Result<Self> {
        Self::builder().build()
    }

    #[must_use]
    pub fn builder() -> TelemetryBuilder {
        TelemetryBuilder::new()
    }

    /// Configuration after options were applied
    pub fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    pub fn log(&self) -> &Logger {
        &self.log
    }

    pub fn store(&self) -> &Arc<dyn DocumentStore> {
        &self.store
    }

    /// Wait until queued entries reach the store
    pub fn flush(&self) -> Result<()> {
        self.log.flush()
    }
}

/// Options for [`Telemetry`]
pub struct TelemetryBuilder {
    json_formatter: bool,
    with_hook: bool,
    console: bool,
    source: Box<dyn ConfigSource>,
    config: Option<TelemetryConfig>,
    store: Option<Arc<dyn DocumentStore>>,
    exit: Option<Arc<dyn ExitStrategy>>,
}

impl TelemetryBuilder {
    pub fn new() -> Self {
        Self {
            json_formatter: false,
            with_hook: false,
            console: true,
            source: Box::new(EnvSource),
            config: None,
            store: None,
            exit: None,
        }
    }

    /// Console lines as JSON objects
    #[must_use = "builder methods return a new value"]
    pub fn json_formatter(mut self) -> Self {
        self.json_formatter = true;
        self
    }

    /// Persist error entries together with their traces
    #[must_use = "builder methods return a new value"]
    pub fn with_hook(mut self) -> Self {
        self.with_hook = true;
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn without_console(mut self) -> Self {
        self.console = false;
        self
    }

    /// Read configuration from `source` instead of the process environment
    #[must_use = "builder methods return a new value"]
    pub fn config_source<C: ConfigSource + 'static>(mut self, source: C) -> Self {
        self.source = Box::new(source);
        self
    }

    /// Use `config` as is; no source is consulted
    #[must_use = "builder methods return a new value"]
    pub fn config(mut self, config: TelemetryConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Persist into `store` instead of the directory store
    #[must_use = "builder methods return a new value"]
    pub fn store(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use = "builder methods return a new value"]
    pub fn exit_strategy(mut self, exit: Arc<dyn ExitStrategy>) -> Self {
        self.exit = Some(exit);
        self
    }

    pub fn build(self) -> Result<Telemetry> {
        let mut config = match self.config {
            Some(config) => config
                .validate()
                .map(|_| config)
                .map_err(|e| e.context("fail to load config"))?,
            None => TelemetryConfig::from_source(self.source.as_ref())
                .map_err(|e| e.context("fail to load config"))?,
        };
        config.json_format |= self.json_formatter;
        config.with_hook |= self.with_hook;

        let store = match self.store {
            Some(store) => store,
            None => open_store(&config).map_err(|e| e.context("fail to open store"))?,
        };

        let writer = AsyncSink::builder(StoreSink::new(Arc::clone(&store)).with_trace(config.with_hook))
            .buffer_size(config.async_buffer)
            .build();

        let mut builder = Logger::builder().level_name(&config.level).sink(writer);
        builder = if !self.console {
            builder.without_console()
        } else if config.json_format {
            builder.console(OutputFormat::Json)
        } else {
            builder.console(OutputFormat::Text)
        };
        if let Some(exit) = self.exit {
            builder = builder.exit_strategy(exit);
        }

        let log = builder.build().map_err(|e| e.context("fail to create log"))?;

        Ok(Telemetry { config, log, store })
    }
}

impl Default for TelemetryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "file")]
fn open_store(config: &TelemetryConfig) -> Result<Arc<dyn DocumentStore>> {
    let store = crate::sinks::JsonlStore::open(&config.store_dir)?;
    Ok(Arc::new(store))
}

#[cfg(not(feature = "file"))]
fn open_store(_config: &TelemetryConfig) -> Result<Arc<dyn DocumentStore>> {
    Err(crate::core::TelemetryError::config(
        "store",
        "no store given and the `file` feature is disabled",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{MapSource, ENV_LOG_LEVEL, ENV_STORE_DIR};
    use crate::core::{LogLevel, RecordingExit, TelemetryError};
    use crate::sinks::{MemoryStore, LOG_COLLECTION, TRACE_COLLECTION};

    fn failed_stage(err: &TelemetryError) -> Option<&str> {
        match err {
            TelemetryError::Context { context, .. } => Some(context.as_str()),
            _ => None,
        }
    }

    fn memory() -> (Arc<MemoryStore>, Arc<dyn DocumentStore>) {
        let store = Arc::new(MemoryStore::new());
        let shared: Arc<dyn DocumentStore> = store.clone();
        (store, shared)
    }

    #[test]
    fn test_defaults_from_empty_source() {
        let (_, store) = memory();
        let telemetry = Telemetry::builder()
            .config_source(MapSource::new())
            .store(store)
            .without_console()
            .build()
            .unwrap();

        assert_eq!(telemetry.log().threshold(), LogLevel::Debug);
        assert!(!telemetry.config().json_format);
        assert!(!telemetry.config().with_hook);
    }

    #[test]
    fn test_options_override_config() {
        let (_, store) = memory();
        let telemetry = Telemetry::builder()
            .config_source(MapSource::new())
            .store(store)
            .json_formatter()
            .with_hook()
            .build()
            .unwrap();

        assert!(telemetry.config().json_format);
        assert!(telemetry.config().with_hook);
        assert_eq!(telemetry.log().sink_count(), 2);
    }

    #[test]
    fn test_bad_level_fails_loading_config() {
        let (_, store) = memory();
        let err = Telemetry::builder()
            .config_source(MapSource::new().with(ENV_LOG_LEVEL, "loud"))
            .store(store)
            .build()
            .err()
            .unwrap();

        assert_eq!(failed_stage(&err), Some("fail to load config"));
        assert!(err.to_string().starts_with("fail to load config: "));
    }

    #[test]
    fn test_entries_reach_the_store() {
        let (memory, store) = memory();
        let telemetry = Telemetry::builder()
            .config_source(MapSource::new())
            .store(store)
            .with_hook()
            .without_console()
            .build()
            .unwrap();

        let err = std::io::Error::new(std::io::ErrorKind::Other, "Internal server error");
        telemetry.log().info("started", &[]);
        telemetry.log().with_trace(&err).error("internal error", &[]);
        telemetry.flush().unwrap();

        assert_eq!(memory.documents(LOG_COLLECTION).len(), 1);
        let traces = memory.documents(TRACE_COLLECTION);
        assert_eq!(traces.len(), 1);
        assert!(!traces[0]["trace"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_fatal_goes_through_exit_strategy() {
        let (memory, store) = memory();
        let exit = RecordingExit::new();
        let telemetry = Telemetry::builder()
            .config_source(MapSource::new())
            .store(store)
            .exit_strategy(Arc::new(exit.clone()))
            .without_console()
            .build()
            .unwrap();

        telemetry.log().fatal("shutting down", &[]);

        assert_eq!(exit.codes(), vec![1]);
        assert_eq!(memory.documents(LOG_COLLECTION).len(), 1);
    }

    #[cfg(feature = "file")]
    #[test]
    fn test_directory_store_from_config() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let source = MapSource::new().with(ENV_STORE_DIR, temp_dir.path().to_string_lossy());

        let telemetry = Telemetry::builder()
            .config_source(source)
            .without_console()
            .build()
            .unwrap();
        telemetry.log().warn("persisted", &[]);
        telemetry.flush().unwrap();

        let path = temp_dir
            .path()
            .join(crate::sinks::jsonl_store::DATABASE)
            .join(format!("{}.jsonl", LOG_COLLECTION));
        assert!(path.exists());
    }
}
