//! Error types for the storage and transport layers

use thiserror::Error;

/// Failure reading or writing the durable message store
#[derive(Error, Debug)]
pub enum StorageError {
    /// The SQLite backend rejected the operation
    #[error("Storage backend error: {0}")]
    Backend(#[from] rusqlite::Error),

    /// Messages could not be encoded or decoded as JSON
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Filesystem error while preparing the store location
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The backend is not usable (poisoned lock, missing data directory, ...)
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Failure talking to the chat endpoint
#[derive(Error, Debug)]
pub enum NetworkError {
    /// The server answered with a non-success status code
    #[error("HTTP error! status: {status}")]
    Status {
        /// Numeric HTTP status
        status: u16,
        /// Response body, kept for diagnostics
        body: String,
    },

    /// Connection, TLS or protocol failure before a response arrived
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The response body was not valid JSON
    #[error("Invalid response body: {0}")]
    Decode(String),

    /// The task carrying the request died before producing a result
    #[error("Request interrupted: {0}")]
    Interrupted(String),
}

impl NetworkError {
    /// HTTP status code, when the failure came from a response
    pub fn status(&self) -> Option<u16> {
        match self {
            NetworkError::Status { status, .. } => Some(*status),
            NetworkError::Request(e) => e.status().map(|s| s.as_u16()),
            NetworkError::Decode(_) | NetworkError::Interrupted(_) => None,
        }
    }
}
