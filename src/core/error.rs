//! Error types for the telemetry logger

pub type Result<T> = std::result::Result<T, TelemetryError>;

#[derive(Debug, thiserror::Error)]
pub enum TelemetryError {
    /// IO error with context
    #[error("IO error while {operation}: {message}")]
    IoOperation {
        operation: String,
        message: String,
        #[source]
        source: std::io::Error,
    },

    /// Generic IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Invalid configuration with details
    #[error("Invalid configuration for {component}: {message}")]
    InvalidConfiguration { component: String, message: String },

    /// Document store error with collection name
    #[error("Store error for collection '{collection}': {message}")]
    StoreError { collection: String, message: String },

    /// Sink failed to accept an entry
    #[error("Sink '{sink}' failed: {message}")]
    SinkError { sink: String, message: String },

    /// Async sink queue is no longer accepting entries
    #[error("Sink '{0}' is shut down")]
    SinkStopped(String),

    /// Context added while bootstrapping a component
    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<TelemetryError>,
    },
}

impl TelemetryError {
    /// Create an IO operation error with context
    pub fn io_operation(
        operation: impl Into<String>,
        message: impl Into<String>,
        source: std::io::Error,
    ) -> Self {
        TelemetryError::IoOperation {
            operation: operation.into(),
            message: message.into(),
            source,
        }
    }

    /// Create an invalid configuration error
    pub fn config(component: impl Into<String>, message: impl Into<String>) -> Self {
        TelemetryError::InvalidConfiguration {
            component: component.into(),
            message: message.into(),
        }
    }

    /// Create a store error
    pub fn store(collection: impl Into<String>, message: impl Into<String>) -> Self {
        TelemetryError::StoreError {
            collection: collection.into(),
            message: message.into(),
        }
    }

    /// Create a sink error
    pub fn sink(sink: impl Into<String>, message: impl Into<String>) -> Self {
        TelemetryError::SinkError {
            sink: sink.into(),
            message: message.into(),
        }
    }

    /// Wrap this error with a description of what was being attempted
    pub fn context(self, context: impl Into<String>) -> Self {
        TelemetryError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or the error it wraps) is a configuration error
    pub fn is_config(&self) -> bool {
        match self {
            TelemetryError::InvalidConfiguration { .. } => true,
            TelemetryError::Context { source, .. } => source.is_config(),
            _ => false,
        }
    }
}
