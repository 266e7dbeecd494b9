//! Error types for Baitbot
//!
//! This module defines all error types used throughout the crate.
//! Uses `thiserror` for ergonomic error handling with automatic `Display` and
//! `Error` trait implementations.

use std::fmt;
use thiserror::Error;

// ============================================================================
// Generation Error Classification
// ============================================================================

/// Structured classification of reply-generation failures.
///
/// Generation failures inside the scheduling loop are logged and the cycle is
/// skipped; the classification only feeds diagnostics.
#[derive(Debug)]
pub enum GenerationError {
    /// 401/403: Invalid API key or authentication failure
    Auth(String),
    /// 429: Rate limit or quota exceeded
    RateLimit(String),
    /// 500/502/503/504: Server-side errors
    Server(String),
    /// Connection failure or timeout before a response arrived
    Network(String),
    /// Response body could not be parsed or lacked a reply
    Malformed(String),
    /// The backend answered with an empty reply
    Empty,
    /// Catch-all for unrecognized errors
    Unknown(String),
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::Auth(msg) => write!(f, "Authentication error: {}", msg),
            GenerationError::RateLimit(msg) => write!(f, "Rate limit error: {}", msg),
            GenerationError::Server(msg) => write!(f, "Server error: {}", msg),
            GenerationError::Network(msg) => write!(f, "Network error: {}", msg),
            GenerationError::Malformed(msg) => write!(f, "Malformed response: {}", msg),
            GenerationError::Empty => write!(f, "Empty reply"),
            GenerationError::Unknown(msg) => write!(f, "Unknown generation error: {}", msg),
        }
    }
}

impl std::error::Error for GenerationError {}

impl GenerationError {
    /// Whether a later attempt has a reasonable chance of succeeding.
    ///
    /// The scheduler never retries on its own; the next trigger simply
    /// tries again. This is surfaced in logs only.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::RateLimit(_)
                | GenerationError::Server(_)
                | GenerationError::Network(_)
                | GenerationError::Empty
        )
    }

    /// HTTP status code associated with this error, if any.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            GenerationError::Auth(_) => Some(401),
            GenerationError::RateLimit(_) => Some(429),
            GenerationError::Server(_) => Some(500),
            _ => None,
        }
    }
}

impl From<GenerationError> for BaitError {
    fn from(err: GenerationError) -> Self {
        BaitError::Generation(err)
    }
}

// ============================================================================
// Primary Error Type
// ============================================================================

/// The primary error type for Baitbot operations.
#[derive(Error, Debug)]
pub enum BaitError {
    /// Invalid or missing configuration, unknown conversation identity at start,
    /// or an agent started twice
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fetch, send or delete failed on the chat platform
    #[error("Transport error: {0}")]
    Transport(String),

    /// The reply generator failed or returned nothing usable
    #[error("Generation error: {0}")]
    Generation(GenerationError),

    /// Unknown conversation or chat index
    #[error("Not found: {0}")]
    NotFound(String),

    /// Standard I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Inbound message pipe closed unexpectedly
    #[error("Bus error: channel closed")]
    BusClosed,
}

/// A specialized `Result` type for Baitbot operations.
pub type Result<T> = std::result::Result<T, BaitError>;
