//! Error types for repbook-core

use thiserror::Error;

/// Result type alias using repbook-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in repbook-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Remote API returned a non-success status
    #[error("API error: {message} ({status})")]
    Api {
        /// HTTP status code
        status: u16,
        /// Message extracted from the response body, or a generic fallback
        message: String,
    },

    /// Activity not found
    #[error("Activity not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// True when this error is a single-record push conflict (HTTP 409).
    ///
    /// Conflicts are informational on the immediate-push path: the record
    /// stays queued and is retried by the next full sync cycle.
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { status: 409, .. })
    }
}
