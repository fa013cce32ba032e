//! Shared error types for the application

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for leadmetrics operations
///
/// The metric core itself never fails: malformed rows degrade into anomalies
/// and empty inputs produce zero-valued results. These variants cover the
/// edges around it (record sources, configuration, output).
#[derive(Debug, Error)]
pub enum Error {
    /// Record source failures (unreadable export, unsupported envelope)
    #[error("Record source error: {message}")]
    Source {
        message: String,
        path: Option<PathBuf>,
        #[source]
        source: Option<std::io::Error>,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic errors with context
    #[error("{context}: {message}")]
    WithContext { context: String, message: String },

    /// JSON errors
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// Snapshot encoding errors
    #[error("Snapshot encoding error: {0}")]
    Snapshot(#[from] postcard::Error),
}

impl Error {
    /// Create a record source error with path context
    pub fn record_source(message: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self::Source {
            message: message.into(),
            path: Some(path.into()),
            source: None,
        }
    }

    /// Create a record source error wrapping an I/O failure
    pub fn source_io(path: impl Into<PathBuf>, err: std::io::Error) -> Self {
        let path = path.into();
        Self::Source {
            message: format!("failed to read {}", path.display()),
            path: Some(path),
            source: Some(err),
        }
    }

    /// Add context to an error
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self::WithContext {
            context: context.into(),
            message: self.to_string(),
        }
    }
}

/// Result type alias using our error type
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}
