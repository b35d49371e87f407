//! Error types for the homework bot

use thiserror::Error;

/// Result type alias using the bot's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Everything that can go wrong inside a polling cycle, plus startup configuration.
///
/// The `Display` output of each variant is what ends up in the failure
/// notification, so messages are written for a human reading the chat.
#[derive(Error, Debug)]
pub enum Error {
    /// The API could not be reached (connect, DNS, timeout, body read)
    #[error("connection problem: {0}")]
    Connectivity(String),

    /// The API answered with something other than 200 OK
    #[error("endpoint {endpoint} is unavailable, API response code: {status}")]
    UnexpectedStatus {
        /// URL that was requested
        endpoint: String,
        /// HTTP status code received
        status: u16,
    },

    /// The payload does not have the expected structure
    #[error("invalid API response: {0}")]
    Shape(String),

    /// A required key is absent from the payload
    #[error("invalid API response: missing key \"{0}\"")]
    MissingKey(String),

    /// The homework carries a status outside the known set
    #[error("undocumented homework status: \"{0}\"")]
    UnknownStatus(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Http(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Create a shape error
    pub fn shape(msg: impl Into<String>) -> Self {
        Self::Shape(msg.into())
    }

    /// Create a missing key error
    pub fn missing_key(key: impl Into<String>) -> Self {
        Self::MissingKey(key.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<::config::ConfigError> for Error {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
