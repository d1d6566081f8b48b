//! Error types for Aura.

use std::time::Duration;

use thiserror::Error;

/// Result type alias using Aura's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for Aura.
#[derive(Error, Debug)]
pub enum Error {
    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] HttpError),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Rate limited, retry after {retry_after_secs:?} seconds")]
    RateLimited {
        retry_after_secs: Option<u64>,
        /// Remaining quota reported alongside the rejection.
        remaining: Option<u32>,
    },

    // Lookup errors
    #[error("Identity mismatch: searched for {query:?}, got {found:?}")]
    IdentityMismatch { query: String, found: String },

    #[error("Top artists unavailable: {0}")]
    UpstreamList(String),

    #[error("No artists found for user {0:?}")]
    NoArtists(String),

    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // Generic errors
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// HTTP-specific errors.
#[derive(Error, Debug)]
pub enum HttpError {
    #[error("Request failed with status {status}: {message}")]
    StatusError { status: u16, message: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timeout")]
    Timeout,

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

impl Error {
    /// Returns true if this is a rate limit error.
    pub const fn is_rate_limited(&self) -> bool {
        matches!(self, Self::RateLimited { .. })
    }

    /// Server-supplied wait before the next attempt, if any.
    pub const fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimited {
                retry_after_secs: Some(secs),
                ..
            } => Some(Duration::from_secs(*secs)),
            _ => None,
        }
    }

    /// Remaining quota reported with a rate-limit response.
    pub const fn remaining_quota(&self) -> Option<u32> {
        match self {
            Self::RateLimited { remaining, .. } => *remaining,
            _ => None,
        }
    }
}
