//! # Record Store Interface
//!
//! A document collection API: every record is a flat JSON object addressed
//! by an opaque id the store assigns. This is the only surface the post
//! service uses to persist state.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::errors::RecordResult;

/// Field map of a single document
pub type Fields = Map<String, Value>;

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

/// One sort criterion for `RecordStore::list`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub ascending: bool,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: true,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            ascending: false,
        }
    }
}

/// Record store trait for a document database
pub trait RecordStore: Send + Sync {
    /// List every document in a collection, sorted by `sort` (first key wins,
    /// later keys break ties). Missing fields sort last in either direction.
    fn list(&self, collection: &str, sort: &[SortKey]) -> RecordResult<Vec<Document>>;

    /// Get a single document
    fn get(&self, collection: &str, id: &str) -> RecordResult<Document>;

    /// Create a document and return its new id
    fn create(&self, collection: &str, fields: Fields) -> RecordResult<String>;

    /// Shallow-merge `fields` into an existing document
    fn update(&self, collection: &str, id: &str, fields: Fields) -> RecordResult<()>;

    /// Delete a document
    fn delete(&self, collection: &str, id: &str) -> RecordResult<()>;

    /// Merge several updates atomically. Either every id exists and every
    /// update is applied, or nothing is written.
    fn batch_update(&self, collection: &str, updates: Vec<(String, Fields)>) -> RecordResult<()>;
}

/// Sort documents in place by a list of sort keys.
pub fn sort_documents(docs: &mut [Document], sort: &[SortKey]) {
    if sort.is_empty() {
        return;
    }
    docs.sort_by(|a, b| {
        for key in sort {
            let cmp = compare_fields(a.get(&key.field), b.get(&key.field), key.ascending);
            if cmp != Ordering::Equal {
                return cmp;
            }
        }
        Ordering::Equal
    });
}

fn present(value: Option<&Value>) -> Option<&Value> {
    match value {
        None | Some(Value::Null) => None,
        v => v,
    }
}

/// Compare two field values. Absent and null values always sort last;
/// `ascending` only flips the order between present values.
fn compare_fields(a: Option<&Value>, b: Option<&Value>, ascending: bool) -> Ordering {
    match (present(a), present(b)) {
        (None, None) => Ordering::Equal,
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (Some(a), Some(b)) => {
            let cmp = compare_values(a, b);
            if ascending {
                cmp
            } else {
                cmp.reverse()
            }
        }
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => a
            .as_f64()
            .unwrap_or(0.0)
            .partial_cmp(&b.as_f64().unwrap_or(0.0))
            .unwrap_or(Ordering::Equal),
        (Value::String(a), Value::String(b)) => {
            // RFC3339 strings with different fractional precision do not
            // compare correctly as text.
            match (
                DateTime::parse_from_rfc3339(a),
                DateTime::parse_from_rfc3339(b),
            ) {
                (Ok(ta), Ok(tb)) => ta.with_timezone(&Utc).cmp(&tb.with_timezone(&Utc)),
                _ => a.cmp(b),
            }
        }
        (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
        _ => Ordering::Equal,
    }
}
