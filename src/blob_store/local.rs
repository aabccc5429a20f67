//! # Local Filesystem Backend

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use super::backend::{validate_path, BlobBackend};
use super::errors::{BlobError, BlobResult};

/// Blobs stored as plain files below a root directory
#[derive(Debug)]
pub struct LocalBackend {
    root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    fn full_path(&self, path: &str) -> BlobResult<PathBuf> {
        validate_path(path)?;
        Ok(self.root.join(path))
    }
}

fn map_io(path: &str, e: std::io::Error) -> BlobError {
    if e.kind() == ErrorKind::NotFound {
        BlobError::ObjectNotFound(path.to_string())
    } else {
        BlobError::Io(format!("{}: {}", path, e))
    }
}

impl BlobBackend for LocalBackend {
    fn write(&self, path: &str, data: &[u8]) -> BlobResult<()> {
        let full_path = self.full_path(path)?;
        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent).map_err(|e| BlobError::Io(e.to_string()))?;
        }
        fs::write(&full_path, data).map_err(|e| map_io(path, e))
    }

    fn read(&self, path: &str) -> BlobResult<Vec<u8>> {
        let full_path = self.full_path(path)?;
        fs::read(&full_path).map_err(|e| map_io(path, e))
    }

    fn delete(&self, path: &str) -> BlobResult<()> {
        let full_path = self.full_path(path)?;
        fs::remove_file(&full_path).map_err(|e| map_io(path, e))
    }

    fn exists(&self, path: &str) -> BlobResult<bool> {
        Ok(self.full_path(path)?.is_file())
    }

    fn list(&self, prefix: &str) -> BlobResult<Vec<String>> {
        let dir = self.full_path(prefix)?;
        if !dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut results = Vec::new();
        for entry in fs::read_dir(&dir).map_err(|e| map_io(prefix, e))? {
            let entry = entry.map_err(|e| BlobError::Io(e.to_string()))?;
            if !entry.path().is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                results.push(format!("{}/{}", prefix, name));
            }
        }
        results.sort();
        Ok(results)
    }
}
