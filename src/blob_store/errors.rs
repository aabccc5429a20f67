//! # Blob Store Errors

use thiserror::Error;

/// Result type for blob operations
pub type BlobResult<T> = Result<T, BlobError>;

/// Blob store errors
#[derive(Debug, Clone, Error)]
pub enum BlobError {
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("File too large: {0} bytes (max: {1})")]
    FileTooLarge(u64, u64),

    /// Download token missing or not issued for this path
    #[error("Invalid download token")]
    InvalidToken,

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl BlobError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            BlobError::ObjectNotFound(_) => 404,
            BlobError::InvalidPath(_) => 400,
            BlobError::FileTooLarge(_, _) => 413,
            BlobError::InvalidToken => 403,
            BlobError::Io(_) => 500,
            BlobError::Internal(_) => 500,
        }
    }
}
