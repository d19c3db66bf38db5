//! Errors raised by the record model, the identifier newtypes and the
//! configuration loader.

use thiserror::Error;

/// Error type for core operations.
#[derive(Error, Debug)]
pub enum CoreError {
    /// Configuration could not be loaded, saved or validated
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Text that is not an 8-14 digit RPPS number
    #[error("invalid RPPS number: expected 8-14 digits, got '{0}'")]
    InvalidRpps(String),

    /// A search scope needs a keyword
    #[error("search keyword cannot be empty")]
    EmptyKeyword,

    /// Text that is not an RFC 3339 timestamp
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// A line of the record store is not a structured record
    #[error("malformed record: {0}")]
    MalformedRecord(String),
}

/// Configuration loading and validation errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// No home directory to derive the config path from
    #[error("could not determine config directory")]
    NoConfigDir,

    /// An explicitly requested config file does not exist
    #[error("config file not found at {path}")]
    NotFound {
        /// Requested path
        path: String,
    },

    /// Config file is not valid TOML for [`crate::AppConfig`]
    #[error("failed to parse config TOML: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Config could not be rendered as TOML
    #[error("failed to serialize config: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// Reading or writing the config file failed
    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A value that would make a run meaningless
    #[error("invalid config value for {field}: {reason}")]
    InvalidValue {
        /// Dotted key, e.g. `retry.max_attempts`
        field: String,
        /// What is wrong with it
        reason: String,
    },
}

/// Result alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Result alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
