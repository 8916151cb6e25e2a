//! Error types for Taskchat
//!
//! This module defines all error types used throughout the application,
//! using `thiserror` for ergonomic error handling.

use thiserror::Error;

/// Main error type for Taskchat operations
///
/// This enum encompasses all possible errors that can occur during
/// configuration loading, command dispatch, backend interactions,
/// and conversation persistence.
#[derive(Error, Debug)]
pub enum TaskchatError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Dispatch-related errors (request building, reply handling)
    #[error("Dispatch error: {0}")]
    Dispatch(String),

    /// Backend rejected the command; carries the server-supplied detail verbatim
    #[error("{detail}")]
    Backend {
        /// HTTP status code returned by the command endpoint
        status: u16,
        /// Human-readable detail string from the error body
        detail: String,
    },

    /// Conversation storage errors (embedded database operations)
    #[error("Storage error: {0}")]
    Storage(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Taskchat operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
