//! Error types for the caseflow engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, EngineError>;

/// Engine error types
#[derive(Debug, Error)]
pub enum EngineError {
    /// Durable storage rejected a read or write
    #[error("storage error: {0}")]
    Storage(#[from] StoreError),

    /// JSON serialization/deserialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote case service call failed
    #[error("remote error: {0}")]
    Remote(#[from] RemoteError),
}

/// Error from the durable key-value store adapter
#[derive(Debug, Error)]
pub enum StoreError {
    /// Filesystem-level failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Backend-specific failure
    #[error("{0}")]
    Backend(String),
}

/// Remote case service error
///
/// The download queue classifies terminal failures on this split: a transport
/// failure ends in `FailedNetwork`, anything the server actively declined
/// ends in plain `Failed`.
#[derive(Debug, Error)]
pub enum RemoteError {
    /// Transport-level failure, server never reached
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    /// Server reachable but declined the request
    #[error("request rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// Server replied with a payload the client could not decode
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    /// Whether this error is transport-level (network unreachable)
    pub fn is_network(&self) -> bool {
        matches!(self, RemoteError::NetworkUnreachable(_))
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            RemoteError::InvalidResponse(e.to_string())
        } else {
            // send() failures (connect, timeout, DNS) are all transport-level
            RemoteError::NetworkUnreachable(e.to_string())
        }
    }
}
