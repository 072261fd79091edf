// src/error.rs

//! Unified error handling for the notifier.

use std::fmt;
use std::path::Path;

use thiserror::Error;

/// Result type alias for notifier operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    /// Shared or per-user configuration is malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// API response could not be parsed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Notification template failed to register or render
    #[error("Template error: {0}")]
    Template(String),

    /// SMTP connection or delivery failed
    #[error("Mail error: {0}")]
    Mail(String),

    /// User state file could not be rewritten
    #[error("Cannot persist {path}: {message}")]
    Persistence { path: String, message: String },
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a parse error.
    pub fn parse(message: impl fmt::Display) -> Self {
        Self::Parse(message.to_string())
    }

    /// Create a template error.
    pub fn template(message: impl fmt::Display) -> Self {
        Self::Template(message.to_string())
    }

    /// Create a mail error.
    pub fn mail(message: impl fmt::Display) -> Self {
        Self::Mail(message.to_string())
    }

    /// Create a persistence error for the given file.
    pub fn persistence(path: &Path, message: impl fmt::Display) -> Self {
        Self::Persistence {
            path: path.display().to_string(),
            message: message.to_string(),
        }
    }

    /// Whether this error came from talking to a remote API.
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Http(_) | Self::Status { .. })
    }
}
