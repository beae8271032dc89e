//! Error types for payqr operations

use thiserror::Error;

/// Result type alias using payqr's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for payqr operations
#[derive(Error, Debug)]
pub enum Error {
    /// Credentials rejected or portal unreachable
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// Expected markup was not found in a portal page
    #[error("Failed to parse portal page: {0}")]
    Parse(String),

    /// Invalid command-line or configuration input
    #[error("Invalid argument: {0}")]
    Validation(String),

    /// QR code encoding failed
    #[error("Failed to encode QR code: {0}")]
    QrEncode(String),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

// Implement From conversions for common error types

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        match e {
            image::ImageError::IoError(io) => Error::Io(io),
            other => Error::Image(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", e))
    }
}
