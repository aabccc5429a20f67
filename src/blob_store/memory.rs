//! # In-Memory Backend

use std::collections::BTreeMap;
use std::sync::RwLock;

use super::backend::{validate_path, BlobBackend};
use super::errors::{BlobError, BlobResult};

/// Blobs held in a map; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryBackend {
    objects: RwLock<BTreeMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored objects
    pub fn len(&self) -> usize {
        self.objects.read().map(|o| o.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl BlobBackend for MemoryBackend {
    fn write(&self, path: &str, data: &[u8]) -> BlobResult<()> {
        validate_path(path)?;
        let mut objects = self
            .objects
            .write()
            .map_err(|_| BlobError::Internal("Lock poisoned".into()))?;
        objects.insert(path.to_string(), data.to_vec());
        Ok(())
    }

    fn read(&self, path: &str) -> BlobResult<Vec<u8>> {
        let objects = self
            .objects
            .read()
            .map_err(|_| BlobError::Internal("Lock poisoned".into()))?;
        objects
            .get(path)
            .cloned()
            .ok_or_else(|| BlobError::ObjectNotFound(path.to_string()))
    }

    fn delete(&self, path: &str) -> BlobResult<()> {
        let mut objects = self
            .objects
            .write()
            .map_err(|_| BlobError::Internal("Lock poisoned".into()))?;
        objects
            .remove(path)
            .map(|_| ())
            .ok_or_else(|| BlobError::ObjectNotFound(path.to_string()))
    }

    fn exists(&self, path: &str) -> BlobResult<bool> {
        let objects = self
            .objects
            .read()
            .map_err(|_| BlobError::Internal("Lock poisoned".into()))?;
        Ok(objects.contains_key(path))
    }

    fn list(&self, prefix: &str) -> BlobResult<Vec<String>> {
        let objects = self
            .objects
            .read()
            .map_err(|_| BlobError::Internal("Lock poisoned".into()))?;
        let dir = format!("{}/", prefix.trim_end_matches('/'));
        Ok(objects
            .keys()
            .filter(|k| k.starts_with(&dir) && !k[dir.len()..].contains('/'))
            .cloned()
            .collect())
    }
}
