// src/error.rs

//! Unified error handling for the tracker.

use std::fmt;

use thiserror::Error;

/// Result type alias for tracker operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// A single upstream source failed or had no match
    #[error("Source {source_name} unavailable: {message}")]
    SourceUnavailable {
        source_name: &'static str,
        message: String,
    },

    /// No source could produce a canonical product URL
    #[error("No product URL could be resolved for '{input}'")]
    UnresolvableUrl { input: String },

    /// The canonical page lacked a usable structured payload
    #[error("No structured product data found at {url}")]
    CanonicalExtractionFailed { url: String },

    /// Persisted state could not be read back
    #[error("Persisted state at {path} is unreadable: {message}")]
    PersistenceCorrupt { path: String, message: String },

    /// Notification delivery failed
    #[error("Notify error: {0}")]
    Notify(String),
}

impl AppError {
    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a source error for the named provider.
    pub fn source_unavailable(source_name: &'static str, message: impl fmt::Display) -> Self {
        Self::SourceUnavailable {
            source_name,
            message: message.to_string(),
        }
    }

    /// Create a corrupt-persistence error.
    pub fn persistence_corrupt(path: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::PersistenceCorrupt {
            path: path.into(),
            message: message.to_string(),
        }
    }

    /// Whether this error should stop the process instead of being
    /// contained to a single input.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::PersistenceCorrupt { .. } | Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = AppError::source_unavailable("search", "HTTP 503");
        assert_eq!(err.to_string(), "Source search unavailable: HTTP 503");

        let err = AppError::UnresolvableUrl {
            input: "pineapple".into(),
        };
        assert!(err.to_string().contains("pineapple"));
    }

    #[test]
    fn test_fatal_classification() {
        assert!(AppError::persistence_corrupt("db.json", "bad json").is_fatal());
        assert!(
            !AppError::CanonicalExtractionFailed {
                url: "https://example.com".into()
            }
            .is_fatal()
        );
    }
}
