//! Error types for the envelope router.

use thiserror::Error;

/// Main error type for router operations.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Invalid subscription request: {0}")]
    InvalidRequest(String),

    #[error("Encoding error: {0}")]
    Encode(String),
}

impl From<serde_json::Error> for RouterError {
    fn from(e: serde_json::Error) -> Self {
        RouterError::Encode(e.to_string())
    }
}

impl From<rmp_serde::encode::Error> for RouterError {
    fn from(e: rmp_serde::encode::Error) -> Self {
        RouterError::Encode(e.to_string())
    }
}

/// Result type for router operations.
pub type Result<T> = std::result::Result<T, RouterError>;
