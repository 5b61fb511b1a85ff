//! Crate-wide error type and result alias.

use thiserror::Error;

/// Errors surfaced by nowspinning components.
#[derive(Debug, Error)]
pub enum SpinError {
    /// Caller supplied a missing or empty artist name.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The summarizer call itself failed (transport, provider error, or
    /// timeout). An empty-but-successful response is not an error.
    #[error("Summarization failed: {0}")]
    Summarization(String),

    /// The cache store could not be read or written. Internal only: the
    /// resolver logs it and degrades to a miss on read, a dropped write
    /// on write.
    #[error("Cache unavailable: {0}")]
    Cache(String),

    /// OAuth token refresh against the streaming provider failed.
    #[error("Token refresh failed: {0}")]
    TokenRefresh(String),

    /// The now-playing upstream returned an unexpected response.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Invalid or incomplete startup configuration.
    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, SpinError>;
