//! # Post Service Errors

use thiserror::Error;

use crate::blob_store::BlobError;
use crate::ordering::OrderingError;
use crate::record_store::RecordError;

use super::validation::ValidationError;

/// Result type for post operations
pub type PostResult<T> = Result<T, PostError>;

/// Errors surfaced by `PostService`
#[derive(Debug, Error)]
pub enum PostError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Ordering(#[from] OrderingError),

    #[error(transparent)]
    Record(#[from] RecordError),

    #[error(transparent)]
    Blob(#[from] BlobError),

    /// The mutation failed after blobs were uploaded. Those blobs are now
    /// unreferenced; `sweep_orphaned_blobs` reclaims them.
    #[error("{source} (orphaned blobs: {})", blobs.join(", "))]
    Orphaned {
        blobs: Vec<String>,
        source: Box<PostError>,
    },
}

impl PostError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            PostError::Validation(e) => e.status_code(),
            PostError::Ordering(e) => e.status_code(),
            PostError::Record(e) => e.status_code(),
            PostError::Blob(e) => e.status_code(),
            PostError::Orphaned { source, .. } => source.status_code(),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            PostError::Validation(ValidationError::UploadTooLarge { .. }) => "FILE_TOO_LARGE",
            PostError::Validation(_) => "VALIDATION_ERROR",
            PostError::Ordering(_) => "ORDERING_ERROR",
            PostError::Record(RecordError::NotFound { .. }) => "POST_NOT_FOUND",
            PostError::Record(_) => "RECORD_STORE_ERROR",
            PostError::Blob(BlobError::FileTooLarge(_, _)) => "FILE_TOO_LARGE",
            PostError::Blob(BlobError::ObjectNotFound(_)) => "BLOB_NOT_FOUND",
            PostError::Blob(BlobError::InvalidToken) => "INVALID_TOKEN",
            PostError::Blob(_) => "BLOB_STORE_ERROR",
            PostError::Orphaned { source, .. } => source.code(),
        }
    }

    /// Blob paths left behind, if any
    pub fn orphaned_blobs(&self) -> &[String] {
        match self {
            PostError::Orphaned { blobs, .. } => blobs,
            _ => &[],
        }
    }
}
