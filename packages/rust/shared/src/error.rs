//! Error types for toolscout.
//!
//! Library crates use [`ToolscoutError`] via `thiserror`.
//! The CLI wraps this with `color-eyre` for rich diagnostics.

use std::path::PathBuf;

/// Top-level error type for all toolscout operations.
#[derive(Debug, thiserror::Error)]
pub enum ToolscoutError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// Network/HTTP error while fetching a page or an asset.
    #[error("network error: {0}")]
    Network(String),

    /// HTML, JSON, or completion parsing error.
    #[error("parse error: {message}")]
    Parse { message: String },

    /// CMS query or asset upload error.
    #[error("cms error: {0}")]
    Cms(String),

    /// AI provider failure that is not an HTTP status: transport, refusal,
    /// or a completion with nothing in it.
    #[error("{provider} error: {message}")]
    Model { provider: String, message: String },

    /// A CMS or AI endpoint answered with a non-success status.
    #[error("{service} returned HTTP {status}: {body}")]
    Http {
        service: String,
        status: u16,
        body: String,
    },

    /// Filesystem I/O error.
    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    /// Data validation error (model output is not the expected shape, etc.).
    #[error("validation error: {message}")]
    Validation { message: String },
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ToolscoutError>;

impl ToolscoutError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create a parse error from any displayable message.
    pub fn parse(msg: impl Into<String>) -> Self {
        Self::Parse {
            message: msg.into(),
        }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }

    /// Create a model error for the named provider.
    pub fn model(provider: impl std::fmt::Display, msg: impl Into<String>) -> Self {
        Self::Model {
            provider: provider.to_string(),
            message: msg.into(),
        }
    }

    /// Create an HTTP status error; `body` is kept verbatim for diagnostics.
    pub fn http(service: impl std::fmt::Display, status: u16, body: impl Into<String>) -> Self {
        Self::Http {
            service: service.to_string(),
            status,
            body: body.into(),
        }
    }

    /// The HTTP status, when the error came from a non-success response.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Wrap a `std::io::Error` with a path for context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
