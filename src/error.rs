use thiserror::Error;

use crate::validator::TargetCheckResult;

/// Type alias for Result with ChainBlockError
pub type Result<T> = std::result::Result<T, ChainBlockError>;

/// Error types for the chain block engine
#[derive(Error, Debug)]
pub enum ChainBlockError {
    /// Upstream API returned an error
    #[error("API error: {0}")]
    ApiError(String),

    /// Upstream signalled a rate limit for the requested endpoint
    #[error("Rate limited on {endpoint}")]
    RateLimited { endpoint: String },

    /// Network-related error (connection issues, timeouts, etc.)
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Operation is not allowed in the session's current state
    #[error("Invalid session state: {0}")]
    InvalidState(String),

    /// Pre-flight validation refused the request
    #[error("Request rejected: {0:?}")]
    Rejected(TargetCheckResult),

    /// Target kind has no member source in this engine
    #[error("Unsupported target: {0}")]
    UnsupportedTarget(String),

    /// No session registered under the given id
    #[error("Session not found: {0}")]
    SessionNotFound(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic catch-all error
    #[error("Unknown error: {0}")]
    Unknown(String),
}

impl ChainBlockError {
    /// Check if the error is the upstream rate-limit signal
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ChainBlockError::RateLimited { .. })
    }
}
