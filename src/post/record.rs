//! Flat persisted shape of a post
//!
//! The record store holds posts as camelCase documents. Content is encoded
//! there as `fileUrl` + `contentFileName` + `isExternalLink`; the three are
//! always written together so a record can never claim an external link and
//! a blob key at the same time.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;

use crate::record_store::{Document, Fields};

use super::model::{ContentLink, Post, Thumbnail};

/// Collection holding posts
pub const POSTS_COLLECTION: &str = "posts";

/// Persisted field names
pub mod field {
    pub const TITLE: &str = "title";
    pub const DESCRIPTION: &str = "description";
    pub const IMAGE_URL: &str = "imageUrl";
    pub const IMAGE_FILE_NAME: &str = "imageFileName";
    pub const FILE_URL: &str = "fileUrl";
    pub const CONTENT_FILE_NAME: &str = "contentFileName";
    pub const IS_EXTERNAL_LINK: &str = "isExternalLink";
    pub const ORDER: &str = "order";
    pub const CREATED_AT: &str = "createdAt";
    pub const UPDATED_AT: &str = "updatedAt";
}

/// A post document as found in the store, before normalization.
///
/// Every field is optional so rows written by older versions still decode.
/// `order` is kept raw: negative or non-integer ranks are legal input here.
/// A field holding a value of the wrong type decodes as absent and is named
/// in `unreadable`; one bad field never makes the whole row unusable.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PostRecord {
    pub title: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub image_file_name: Option<String>,
    pub file_url: Option<String>,
    pub content_file_name: Option<String>,
    pub is_external_link: Option<bool>,
    pub order: Option<Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Persisted names of fields that were present but unreadable
    pub unreadable: Vec<&'static str>,
}

impl PostRecord {
    pub fn from_document(doc: &Document) -> Self {
        let mut decoder = FieldDecoder {
            fields: &doc.fields,
            unreadable: Vec::new(),
        };
        Self {
            title: decoder.text(field::TITLE),
            description: decoder.text(field::DESCRIPTION),
            image_url: decoder.text(field::IMAGE_URL),
            image_file_name: decoder.text(field::IMAGE_FILE_NAME),
            file_url: decoder.text(field::FILE_URL),
            content_file_name: decoder.text(field::CONTENT_FILE_NAME),
            is_external_link: decoder.flag(field::IS_EXTERNAL_LINK),
            order: decoder.raw(field::ORDER),
            created_at: decoder.timestamp(field::CREATED_AT),
            updated_at: decoder.timestamp(field::UPDATED_AT),
            unreadable: decoder.unreadable,
        }
    }
}

struct FieldDecoder<'a> {
    fields: &'a Fields,
    unreadable: Vec<&'static str>,
}

impl FieldDecoder<'_> {
    fn raw(&self, name: &'static str) -> Option<Value> {
        match self.fields.get(name) {
            None | Some(Value::Null) => None,
            Some(value) => Some(value.clone()),
        }
    }

    fn decode<T>(&mut self, name: &'static str, read: impl FnOnce(&Value) -> Option<T>) -> Option<T> {
        let value = self.raw(name)?;
        let decoded = read(&value);
        if decoded.is_none() {
            self.unreadable.push(name);
        }
        decoded
    }

    fn text(&mut self, name: &'static str) -> Option<String> {
        self.decode(name, |v| v.as_str().map(str::to_string))
    }

    fn flag(&mut self, name: &'static str) -> Option<bool> {
        self.decode(name, Value::as_bool)
    }

    fn timestamp(&mut self, name: &'static str) -> Option<DateTime<Utc>> {
        self.decode(name, |v| {
            v.as_str()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                .map(|ts| ts.with_timezone(&Utc))
        })
    }
}

fn timestamp(ts: DateTime<Utc>) -> Value {
    Value::String(ts.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn optional_string(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::String(s.to_string()))
}

/// Title and description
pub fn text_fields(title: &str, description: &str) -> Fields {
    let mut fields = Fields::new();
    fields.insert(field::TITLE.into(), Value::String(title.to_string()));
    fields.insert(field::DESCRIPTION.into(), Value::String(description.to_string()));
    fields
}

/// `imageUrl` and `imageFileName`
pub fn image_fields(image: Option<&Thumbnail>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(
        field::IMAGE_URL.into(),
        optional_string(image.map(|t| t.url.as_str())),
    );
    fields.insert(
        field::IMAGE_FILE_NAME.into(),
        optional_string(image.and_then(|t| t.file_name.as_deref())),
    );
    fields
}

/// The content triple, always written as one unit
pub fn content_fields(content: Option<&ContentLink>) -> Fields {
    let mut fields = Fields::new();
    let (url, file_name, external) = match content {
        Some(ContentLink::File { url, file_name }) => {
            (Value::String(url.clone()), Value::String(file_name.clone()), Value::Bool(false))
        }
        Some(ContentLink::ExternalUrl { url }) => {
            (Value::String(url.clone()), Value::Null, Value::Bool(true))
        }
        None => (Value::Null, Value::Null, Value::Null),
    };
    fields.insert(field::FILE_URL.into(), url);
    fields.insert(field::CONTENT_FILE_NAME.into(), file_name);
    fields.insert(field::IS_EXTERNAL_LINK.into(), external);
    fields
}

pub fn order_fields(order: u32) -> Fields {
    let mut fields = Fields::new();
    fields.insert(field::ORDER.into(), Value::from(order));
    fields
}

pub fn updated_at_fields(ts: DateTime<Utc>) -> Fields {
    let mut fields = Fields::new();
    fields.insert(field::UPDATED_AT.into(), timestamp(ts));
    fields
}

impl Post {
    /// Every persisted field except the id
    pub fn to_fields(&self) -> Fields {
        let mut fields = text_fields(&self.title, &self.description);
        fields.extend(image_fields(self.image.as_ref()));
        fields.extend(content_fields(self.content.as_ref()));
        fields.insert(
            field::ORDER.into(),
            self.order.map_or(Value::Null, Value::from),
        );
        fields.insert(
            field::CREATED_AT.into(),
            self.created_at.map_or(Value::Null, timestamp),
        );
        fields.insert(
            field::UPDATED_AT.into(),
            self.updated_at.map_or(Value::Null, timestamp),
        );
        fields
    }
}
