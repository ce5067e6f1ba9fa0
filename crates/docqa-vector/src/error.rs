//! Vector store error types.

use thiserror::Error;

/// Result type for vector store operations.
pub type VectorResult<T> = Result<T, VectorError>;

/// Vector store errors.
#[derive(Debug, Error)]
pub enum VectorError {
    /// Connection error.
    #[error("connection error: {0}")]
    Connection(String),

    /// Index not found.
    #[error("index not found: {0}")]
    IndexNotFound(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Authentication error.
    #[error("authentication error: {0}")]
    Authentication(String),

    /// Operation timeout.
    #[error("operation timed out: {0}")]
    Timeout(String),

    /// Vector dimension mismatch.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Backend-specific error.
    #[error("backend error: {0}")]
    Backend(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl VectorError {
    /// Creates a connection error.
    pub fn connection(msg: impl Into<String>) -> Self {
        Self::Connection(msg.into())
    }

    /// Creates an index not found error.
    pub fn index_not_found(name: impl Into<String>) -> Self {
        Self::IndexNotFound(name.into())
    }

    /// Creates an invalid config error.
    pub fn invalid_config(msg: impl Into<String>) -> Self {
        Self::InvalidConfig(msg.into())
    }

    /// Creates an authentication error.
    pub fn authentication(msg: impl Into<String>) -> Self {
        Self::Authentication(msg.into())
    }

    /// Creates a timeout error.
    pub fn timeout(msg: impl Into<String>) -> Self {
        Self::Timeout(msg.into())
    }

    /// Creates a dimension mismatch error.
    pub fn dimension_mismatch(expected: usize, actual: usize) -> Self {
        Self::DimensionMismatch { expected, actual }
    }

    /// Creates a backend error.
    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// Creates a serialization error.
    pub fn serialization(msg: impl Into<String>) -> Self {
        Self::Serialization(msg.into())
    }
}

impl From<serde_json::Error> for VectorError {
    fn from(err: serde_json::Error) -> Self {
        Self::serialization(err.to_string())
    }
}

impl From<reqwest::Error> for VectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::timeout(err.to_string())
        } else if err.is_decode() {
            Self::serialization(err.to_string())
        } else {
            Self::connection(err.to_string())
        }
    }
}

impl From<VectorError> for docqa_core::Error {
    fn from(err: VectorError) -> Self {
        match err {
            VectorError::IndexNotFound(name) => docqa_core::Error::index_not_found(name),
            VectorError::DimensionMismatch { .. } | VectorError::InvalidConfig(_) => {
                docqa_core::Error::config(err.to_string())
            }
            VectorError::Authentication(_) => docqa_core::Error::config(format!(
                "vector index rejected the credentials: {err}"
            )),
            _ => docqa_core::Error::index(err.to_string()).with_source(err),
        }
    }
}
