//! # Blob Backend Trait

use super::errors::{BlobError, BlobResult};

/// Raw object storage addressed by slash-separated relative paths
pub trait BlobBackend: Send + Sync + std::fmt::Debug {
    /// Write data to path, replacing any existing object
    fn write(&self, path: &str, data: &[u8]) -> BlobResult<()>;

    /// Read data from path
    fn read(&self, path: &str) -> BlobResult<Vec<u8>>;

    /// Delete the object at path; `ObjectNotFound` if absent
    fn delete(&self, path: &str) -> BlobResult<()>;

    /// Check if path exists
    fn exists(&self, path: &str) -> BlobResult<bool>;

    /// List object paths directly under `prefix`
    fn list(&self, prefix: &str) -> BlobResult<Vec<String>>;
}

/// Reject paths that could escape the store root.
pub fn validate_path(path: &str) -> BlobResult<()> {
    let bad = path.is_empty()
        || path.starts_with('/')
        || path.contains('\\')
        || path.split('/').any(|seg| seg.is_empty() || seg == "." || seg == "..");
    if bad {
        Err(BlobError::InvalidPath(path.to_string()))
    } else {
        Ok(())
    }
}
