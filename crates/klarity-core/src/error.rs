//! Error types for klarity.

use thiserror::Error;

/// Result type alias using klarity's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for klarity operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Resource not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input (rejected before anything is stored)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Analysis generation failed
    #[error("Inference error: {0}")]
    Inference(String),

    /// Quality model could not be trained, evaluated or restored
    #[error("Model error: {0}")]
    Model(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// HTTP/network request failed
    #[error("Request error: {0}")]
    Request(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::Request(e.to_string())
    }
}
