//! Error types for the registry subsystem.

use thiserror::Error;

/// Errors that can occur during a registry lookup.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The tier has no API credential configured
    #[error("no API credential configured for {provider}")]
    MissingCredential {
        /// Provider name
        provider: String,
    },

    /// The registry does not know this identifier
    #[error("{provider} has no company for {identifier}")]
    NotFound {
        /// Provider name
        provider: String,
        /// Identifier that was looked up
        identifier: String,
    },

    /// API error with status code
    #[error("API error ({provider}): status {status}, {message}")]
    ApiError {
        /// Provider name
        provider: String,
        /// HTTP status code
        status: u16,
        /// Error message
        message: String,
    },

    /// Rate limit exceeded
    #[error("rate limit exceeded for {provider}")]
    RateLimited {
        /// Provider name
        provider: String,
    },

    /// Invalid API key or authentication failure
    #[error("authentication failed for {provider}: {message}")]
    AuthenticationFailed {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Response could not be interpreted
    #[error("failed to parse {provider} response: {message}")]
    ParseError {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// The lookup did not finish within the configured bound
    #[error("{provider} lookup timed out after {seconds}s")]
    Timeout {
        /// Provider name
        provider: String,
        /// Timeout that elapsed
        seconds: u64,
    },

    /// Transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Client construction and other internal failures
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;
