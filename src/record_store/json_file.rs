//! # Durable JSON-File Record Store
//!
//! Each collection lives in `<root>/<name>.json`:
//!
//! ```text
//! { "format_version": 1, "checksum": "crc32:xxxxxxxx", "documents": { id: {...}, ... } }
//! ```
//!
//! Every mutation is staged on a copy of the in-memory state, the affected
//! collection file is rewritten (temp file, fsync, rename, directory fsync)
//! and only then does the staged state replace the live one. A batch update
//! therefore either lands completely on disk or not at all.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use crc32fast::Hasher;
use serde::{Deserialize, Serialize};

use super::errors::{RecordError, RecordResult};
use super::memory::{CollectionDocs, CollectionSet};
use super::store::{Document, Fields, RecordStore, SortKey};

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Serialize, Deserialize)]
struct CollectionFile {
    format_version: u32,
    checksum: String,
    documents: CollectionDocs,
}

/// Record store persisted as one JSON file per collection
#[derive(Debug)]
pub struct JsonFileRecordStore {
    root: PathBuf,
    inner: RwLock<CollectionSet>,
}

impl JsonFileRecordStore {
    /// Open (or create) a store rooted at `root`, loading every collection
    /// file found there. A file failing its checksum aborts the open.
    pub fn open(root: impl Into<PathBuf>) -> RecordResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)
            .map_err(|e| RecordError::Io(format!("{}: {}", root.display(), e)))?;

        let mut set = CollectionSet::new();
        let entries = fs::read_dir(&root)
            .map_err(|e| RecordError::Io(format!("{}: {}", root.display(), e)))?;
        for entry in entries {
            let entry = entry.map_err(|e| RecordError::Io(e.to_string()))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let docs = Self::read_collection(&path)?;
            set.insert_collection(name.to_string(), docs);
        }

        Ok(Self {
            root,
            inner: RwLock::new(set),
        })
    }

    fn collection_path(&self, collection: &str) -> RecordResult<PathBuf> {
        validate_collection_name(collection)?;
        Ok(self.root.join(format!("{}.json", collection)))
    }

    fn read_collection(path: &Path) -> RecordResult<CollectionDocs> {
        let content = fs::read_to_string(path)
            .map_err(|e| RecordError::Io(format!("{}: {}", path.display(), e)))?;
        let file: CollectionFile = serde_json::from_str(&content).map_err(|e| {
            RecordError::Corrupted(format!("{}: unparseable: {}", path.display(), e))
        })?;
        if file.format_version != FORMAT_VERSION {
            return Err(RecordError::Corrupted(format!(
                "{}: unsupported format_version {}",
                path.display(),
                file.format_version
            )));
        }
        let expected = checksum_of(&file.documents)?;
        if file.checksum != expected {
            return Err(RecordError::Corrupted(format!(
                "{}: checksum mismatch (stored {}, computed {})",
                path.display(),
                file.checksum,
                expected
            )));
        }
        Ok(file.documents)
    }

    fn write_collection(&self, collection: &str, docs: &CollectionDocs) -> RecordResult<()> {
        let path = self.collection_path(collection)?;
        let temp_path = path.with_extension("json.tmp");

        let file = CollectionFile {
            format_version: FORMAT_VERSION,
            checksum: checksum_of(docs)?,
            documents: docs.clone(),
        };
        let content = serde_json::to_vec_pretty(&file)?;

        let mut out = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_path)
            .map_err(|e| RecordError::Io(format!("{}: {}", temp_path.display(), e)))?;
        out.write_all(&content)
            .map_err(|e| RecordError::Io(format!("{}: {}", temp_path.display(), e)))?;
        out.sync_all()
            .map_err(|e| RecordError::Io(format!("{}: {}", temp_path.display(), e)))?;

        fs::rename(&temp_path, &path)
            .map_err(|e| RecordError::Io(format!("{}: {}", path.display(), e)))?;

        if let Ok(dir) = File::open(&self.root) {
            let _ = dir.sync_all();
        }
        Ok(())
    }

    /// Apply `f` to a staged copy, persist the collection, then publish.
    fn mutate<T>(
        &self,
        collection: &str,
        f: impl FnOnce(&mut CollectionSet) -> RecordResult<T>,
    ) -> RecordResult<T> {
        validate_collection_name(collection)?;
        let mut live = self
            .inner
            .write()
            .map_err(|_| RecordError::Internal("Lock poisoned".into()))?;

        let mut staged = live.clone();
        let out = f(&mut staged)?;

        let empty = CollectionDocs::new();
        let docs = staged.documents(collection).unwrap_or(&empty);
        self.write_collection(collection, docs)?;

        *live = staged;
        Ok(out)
    }
}

impl RecordStore for JsonFileRecordStore {
    fn list(&self, collection: &str, sort: &[SortKey]) -> RecordResult<Vec<Document>> {
        let set = self
            .inner
            .read()
            .map_err(|_| RecordError::Internal("Lock poisoned".into()))?;
        Ok(set.list(collection, sort))
    }

    fn get(&self, collection: &str, id: &str) -> RecordResult<Document> {
        let set = self
            .inner
            .read()
            .map_err(|_| RecordError::Internal("Lock poisoned".into()))?;
        set.get(collection, id)
    }

    fn create(&self, collection: &str, fields: Fields) -> RecordResult<String> {
        self.mutate(collection, |set| Ok(set.create(collection, fields)))
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> RecordResult<()> {
        self.mutate(collection, |set| set.update(collection, id, fields))
    }

    fn delete(&self, collection: &str, id: &str) -> RecordResult<()> {
        self.mutate(collection, |set| set.delete(collection, id))
    }

    fn batch_update(&self, collection: &str, updates: Vec<(String, Fields)>) -> RecordResult<()> {
        self.mutate(collection, |set| set.batch_update(collection, updates))
    }
}

fn checksum_of(docs: &CollectionDocs) -> RecordResult<String> {
    let bytes = serde_json::to_vec(docs)?;
    let mut hasher = Hasher::new();
    hasher.update(&bytes);
    Ok(format!("crc32:{:08x}", hasher.finalize()))
}

fn validate_collection_name(name: &str) -> RecordResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(RecordError::InvalidCollection(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};
    use tempfile::TempDir;

    fn fields(value: Value) -> Fields {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_survives_reopen() {
        let temp = TempDir::new().unwrap();
        let id = {
            let store = JsonFileRecordStore::open(temp.path()).unwrap();
            store
                .create("posts", fields(json!({"title": "Kept", "order": 0})))
                .unwrap()
        };

        let reopened = JsonFileRecordStore::open(temp.path()).unwrap();
        let doc = reopened.get("posts", &id).unwrap();
        assert_eq!(doc.get("title").unwrap(), "Kept");
    }

    #[test]
    fn test_checksum_mismatch_is_corruption() {
        let temp = TempDir::new().unwrap();
        {
            let store = JsonFileRecordStore::open(temp.path()).unwrap();
            store.create("posts", fields(json!({"title": "A"}))).unwrap();
        }

        let path = temp.path().join("posts.json");
        let content = fs::read_to_string(&path).unwrap();
        fs::write(&path, content.replace("\"A\"", "\"B\"")).unwrap();

        let result = JsonFileRecordStore::open(temp.path());
        assert!(matches!(result, Err(RecordError::Corrupted(_))));
    }

    #[test]
    fn test_failed_batch_leaves_disk_untouched() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileRecordStore::open(temp.path()).unwrap();
        let a = store.create("posts", fields(json!({"order": 0}))).unwrap();

        let result = store.batch_update(
            "posts",
            vec![
                (a.clone(), fields(json!({"order": 9}))),
                ("missing".into(), fields(json!({"order": 1}))),
            ],
        );
        assert!(result.is_err());

        let reopened = JsonFileRecordStore::open(temp.path()).unwrap();
        assert_eq!(reopened.get("posts", &a).unwrap().get("order").unwrap(), 0);
    }

    #[test]
    fn test_rejects_path_like_collection() {
        let temp = TempDir::new().unwrap();
        let store = JsonFileRecordStore::open(temp.path()).unwrap();
        let result = store.create("../escape", Fields::new());
        assert!(matches!(result, Err(RecordError::InvalidCollection(_))));
    }

    #[test]
    fn test_ignores_non_json_files() {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("notes.txt"), "hello").unwrap();
        let store = JsonFileRecordStore::open(temp.path()).unwrap();
        assert!(store.list("notes", &[]).unwrap().is_empty());
    }
}
