//! Application error types with rich context

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Application error types organized by layer/domain
#[derive(Debug, Error)]
pub enum Error {
    // ─────────────────────────────────────────────────────────────
    // Common/Infrastructure Errors
    // ─────────────────────────────────────────────────────────────
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON encoding error: {0}")]
    Json(#[from] serde_json::Error),

    // ─────────────────────────────────────────────────────────────
    // Terminal/TUI Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Terminal error: {message}")]
    Terminal { message: String },

    #[error("Render error: {message}")]
    Render { message: String },

    // ─────────────────────────────────────────────────────────────
    // Line Source Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Failed to open line source {source_label}: {reason}")]
    SourceOpen {
        source_label: String,
        reason: String,
    },

    #[error("Program not found for line source: {program}")]
    SourceNotFound { program: String },

    #[error("Invalid line source specification: {spec:?}")]
    InvalidSource { spec: String },

    #[error("Serial port error: {message}")]
    Serial { message: String },

    // ─────────────────────────────────────────────────────────────
    // Configuration Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Invalid configuration: {message}")]
    ConfigInvalid { message: String },

    // ─────────────────────────────────────────────────────────────
    // Export Errors
    // ─────────────────────────────────────────────────────────────
    #[error("Export file error at {path}: {message}")]
    Export { path: PathBuf, message: String },
}

// ─────────────────────────────────────────────────────────────────
// Convenience Constructors
// ─────────────────────────────────────────────────────────────────

impl Error {
    pub fn terminal(message: impl Into<String>) -> Self {
        Self::Terminal {
            message: message.into(),
        }
    }

    pub fn render(message: impl Into<String>) -> Self {
        Self::Render {
            message: message.into(),
        }
    }

    pub fn source_open(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SourceOpen {
            source_label: label.into(),
            reason: reason.into(),
        }
    }

    pub fn source_not_found(program: impl Into<String>) -> Self {
        Self::SourceNotFound {
            program: program.into(),
        }
    }

    pub fn invalid_source(spec: impl Into<String>) -> Self {
        Self::InvalidSource { spec: spec.into() }
    }

    pub fn serial(message: impl Into<String>) -> Self {
        Self::Serial {
            message: message.into(),
        }
    }

    pub fn config_invalid(message: impl Into<String>) -> Self {
        Self::ConfigInvalid {
            message: message.into(),
        }
    }

    pub fn export(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Export {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error should trigger application exit
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::SourceOpen { .. }
                | Error::SourceNotFound { .. }
                | Error::InvalidSource { .. }
                | Error::ConfigInvalid { .. }
                | Error::Terminal { .. }
        )
    }
}

// ─────────────────────────────────────────────────────────────────
// Error Context Extensions
// ─────────────────────────────────────────────────────────────────

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Add context to an error
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T, E: Into<Error>> ResultExt<T> for std::result::Result<T, E> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| {
            let err = e.into();
            tracing::error!("{}: {:?}", context.into(), err);
            err
        })
    }
}
