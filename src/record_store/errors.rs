//! # Record Store Errors

use thiserror::Error;

/// Result type for record store operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Record store errors
#[derive(Debug, Clone, Error)]
pub enum RecordError {
    #[error("Record not found: {collection}/{id}")]
    NotFound { collection: String, id: String },

    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("I/O error: {0}")]
    Io(String),

    /// Persisted state failed its checksum or could not be parsed
    #[error("Collection corrupted: {0}")]
    Corrupted(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RecordError {
    pub fn not_found(collection: &str, id: &str) -> Self {
        RecordError::NotFound {
            collection: collection.to_string(),
            id: id.to_string(),
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            RecordError::NotFound { .. } => 404,
            RecordError::InvalidCollection(_) => 400,
            RecordError::Serialization(_) => 500,
            RecordError::Io(_) => 500,
            RecordError::Corrupted(_) => 500,
            RecordError::Internal(_) => 500,
        }
    }
}

impl From<serde_json::Error> for RecordError {
    fn from(e: serde_json::Error) -> Self {
        RecordError::Serialization(e.to_string())
    }
}
