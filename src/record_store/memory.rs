//! # In-Memory Record Store

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use uuid::Uuid;

use super::errors::{RecordError, RecordResult};
use super::store::{sort_documents, Document, Fields, RecordStore, SortKey};

/// Documents of one collection, keyed by id
pub(crate) type CollectionDocs = BTreeMap<String, Fields>;

/// All collections held by a store. Shared by the in-memory and the
/// file-backed store; the latter stages mutations on a clone.
#[derive(Debug, Default, Clone)]
pub(crate) struct CollectionSet {
    collections: HashMap<String, CollectionDocs>,
}

impl CollectionSet {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert_collection(&mut self, name: String, docs: CollectionDocs) {
        self.collections.insert(name, docs);
    }

    pub(crate) fn documents(&self, collection: &str) -> Option<&CollectionDocs> {
        self.collections.get(collection)
    }

    pub(crate) fn list(&self, collection: &str, sort: &[SortKey]) -> Vec<Document> {
        let mut docs: Vec<Document> = self
            .collections
            .get(collection)
            .map(|c| {
                c.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();
        sort_documents(&mut docs, sort);
        docs
    }

    pub(crate) fn get(&self, collection: &str, id: &str) -> RecordResult<Document> {
        self.collections
            .get(collection)
            .and_then(|c| c.get(id))
            .map(|fields| Document::new(id, fields.clone()))
            .ok_or_else(|| RecordError::not_found(collection, id))
    }

    pub(crate) fn create(&mut self, collection: &str, mut fields: Fields) -> String {
        let id = Uuid::new_v4().to_string();
        // The id lives outside the field map.
        fields.remove("id");
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);
        id
    }

    pub(crate) fn update(&mut self, collection: &str, id: &str, fields: Fields) -> RecordResult<()> {
        let existing = self
            .collections
            .get_mut(collection)
            .and_then(|c| c.get_mut(id))
            .ok_or_else(|| RecordError::not_found(collection, id))?;
        for (key, value) in fields {
            if key != "id" {
                existing.insert(key, value);
            }
        }
        Ok(())
    }

    pub(crate) fn delete(&mut self, collection: &str, id: &str) -> RecordResult<()> {
        self.collections
            .get_mut(collection)
            .and_then(|c| c.remove(id))
            .map(|_| ())
            .ok_or_else(|| RecordError::not_found(collection, id))
    }

    pub(crate) fn batch_update(
        &mut self,
        collection: &str,
        updates: Vec<(String, Fields)>,
    ) -> RecordResult<()> {
        // Validate every target before touching anything.
        let docs = self.collections.get(collection);
        for (id, _) in &updates {
            if !docs.map(|c| c.contains_key(id)).unwrap_or(false) {
                return Err(RecordError::not_found(collection, id));
            }
        }
        for (id, fields) in updates {
            self.update(collection, &id, fields)?;
        }
        Ok(())
    }
}

/// Record store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    inner: RwLock<CollectionSet>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(CollectionSet::new()),
        }
    }

    fn read(&self) -> RecordResult<std::sync::RwLockReadGuard<'_, CollectionSet>> {
        self.inner
            .read()
            .map_err(|_| RecordError::Internal("Lock poisoned".into()))
    }

    fn write(&self) -> RecordResult<std::sync::RwLockWriteGuard<'_, CollectionSet>> {
        self.inner
            .write()
            .map_err(|_| RecordError::Internal("Lock poisoned".into()))
    }
}

impl RecordStore for MemoryRecordStore {
    fn list(&self, collection: &str, sort: &[SortKey]) -> RecordResult<Vec<Document>> {
        Ok(self.read()?.list(collection, sort))
    }

    fn get(&self, collection: &str, id: &str) -> RecordResult<Document> {
        self.read()?.get(collection, id)
    }

    fn create(&self, collection: &str, fields: Fields) -> RecordResult<String> {
        Ok(self.write()?.create(collection, fields))
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> RecordResult<()> {
        self.write()?.update(collection, id, fields)
    }

    fn delete(&self, collection: &str, id: &str) -> RecordResult<()> {
        self.write()?.delete(collection, id)
    }

    fn batch_update(&self, collection: &str, updates: Vec<(String, Fields)>) -> RecordResult<()> {
        self.write()?.batch_update(collection, updates)
    }
}
