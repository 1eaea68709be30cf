//! Error types for memora.

use thiserror::Error;

/// Result type alias using memora's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for memora operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (missing endpoint or key)
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed before the backend answered
    #[error("Request error: {0}")]
    Request(String),

    /// Backend answered with a non-success status
    #[error("{message}")]
    Backend { status: u16, message: String },

    /// Operation requires a session that is not held
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Human-readable message suitable for showing to the user.
    ///
    /// Backend errors surface the backend's own text unchanged.
    pub fn user_message(&self) -> String {
        match self {
            Error::Backend { message, .. } => message.clone(),
            other => other.to_string(),
        }
    }

    /// HTTP status reported by the backend, if the error came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Backend { status, .. } => Some(*status),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            Error::Serialization(e.to_string())
        } else {
            Error::Request(e.to_string())
        }
    }
}
