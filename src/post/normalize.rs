//! Legacy row normalization
//!
//! Runs once per load, mapping whatever is in the store onto `Post`.
//! Nothing here writes back; a normalized row is persisted in its new shape
//! only when the operator next edits it (or resequences, for ranks).

use serde_json::Value;

use crate::blob_store::{BlobBackend, BlobPrefix, BlobStore};
use crate::observability::{Event, Logger};

use super::model::{ContentLink, Post, Thumbnail};
use super::record::PostRecord;

/// A legacy-shape fix applied on load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fixup {
    /// No `order` field
    MissingOrder,
    /// `order` negative or not an integer
    InvalidOrder,
    /// `isExternalLink` set alongside a `contentFileName`; the name is dropped
    ExternalLinkFileNameDropped,
    /// `isExternalLink` absent but a `contentFileName` present
    ContentKindInferred,
    /// Content key recovered from a blob URL
    ContentKeyRecovered,
    /// Unrecognized `fileUrl` with no key, kept as an external link
    ContentTreatedAsExternal,
    /// Image key recovered from a blob URL
    ImageKeyRecovered,
    /// Image URL with no traceable key
    ImageKeyUnknown,
    /// Only one of `imageUrl`/`imageFileName` was set and no URL
    ImageFileNameWithoutUrl,
    /// Field present with a value of the wrong type; treated as absent
    UnreadableField(&'static str),
}

impl Fixup {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fixup::MissingOrder => "missing_order",
            Fixup::InvalidOrder => "invalid_order",
            Fixup::ExternalLinkFileNameDropped => "external_link_file_name_dropped",
            Fixup::ContentKindInferred => "content_kind_inferred",
            Fixup::ContentKeyRecovered => "content_key_recovered",
            Fixup::ContentTreatedAsExternal => "content_treated_as_external",
            Fixup::ImageKeyRecovered => "image_key_recovered",
            Fixup::ImageKeyUnknown => "image_key_unknown",
            Fixup::ImageFileNameWithoutUrl => "image_file_name_without_url",
            Fixup::UnreadableField(_) => "unreadable_field",
        }
    }
}

/// Outcome of normalizing one row
#[derive(Debug, Clone)]
pub struct Normalized {
    pub post: Post,
    pub fixups: Vec<Fixup>,
}

/// Map a stored row onto the domain model.
pub fn normalize<B: BlobBackend>(id: &str, record: PostRecord, blobs: &BlobStore<B>) -> Normalized {
    let mut fixups: Vec<Fixup> = record
        .unreadable
        .iter()
        .map(|name| Fixup::UnreadableField(*name))
        .collect();

    let order = match &record.order {
        None | Some(Value::Null) => {
            fixups.push(Fixup::MissingOrder);
            None
        }
        Some(value) => match value.as_u64().and_then(|v| u32::try_from(v).ok()) {
            Some(order) => Some(order),
            None => {
                fixups.push(Fixup::InvalidOrder);
                None
            }
        },
    };

    let content = normalize_content(&record, blobs, &mut fixups);
    let image = normalize_image(&record, blobs, &mut fixups);

    Normalized {
        post: Post {
            id: id.to_string(),
            title: record.title.unwrap_or_default(),
            description: record.description.unwrap_or_default(),
            image,
            content,
            order,
            created_at: record.created_at,
            updated_at: record.updated_at,
        },
        fixups,
    }
}

/// `normalize`, logging every applied fixup.
pub fn normalize_logged<B: BlobBackend>(id: &str, record: PostRecord, blobs: &BlobStore<B>) -> Post {
    let normalized = normalize(id, record, blobs);
    for fixup in &normalized.fixups {
        match fixup {
            Fixup::UnreadableField(name) => Logger::emit(
                Event::PostRecordNormalized,
                &[("post_id", id), ("rule", fixup.as_str()), ("field", *name)],
            ),
            _ => Logger::emit(
                Event::PostRecordNormalized,
                &[("post_id", id), ("rule", fixup.as_str())],
            ),
        }
    }
    normalized.post
}

fn normalize_content<B: BlobBackend>(
    record: &PostRecord,
    blobs: &BlobStore<B>,
    fixups: &mut Vec<Fixup>,
) -> Option<ContentLink> {
    let url = record.file_url.clone()?;
    let file_name = record.content_file_name.clone();

    match (record.is_external_link, file_name) {
        (Some(true), name) => {
            if name.is_some() {
                fixups.push(Fixup::ExternalLinkFileNameDropped);
            }
            Some(ContentLink::ExternalUrl { url })
        }
        (flag, Some(file_name)) => {
            if flag.is_none() {
                fixups.push(Fixup::ContentKindInferred);
            }
            Some(ContentLink::File { url, file_name })
        }
        (_, None) => match blobs.key_from_url(BlobPrefix::Files, &url) {
            Some(file_name) => {
                fixups.push(Fixup::ContentKeyRecovered);
                Some(ContentLink::File { url, file_name })
            }
            None => {
                fixups.push(Fixup::ContentTreatedAsExternal);
                Some(ContentLink::ExternalUrl { url })
            }
        },
    }
}

fn normalize_image<B: BlobBackend>(
    record: &PostRecord,
    blobs: &BlobStore<B>,
    fixups: &mut Vec<Fixup>,
) -> Option<Thumbnail> {
    let Some(url) = record.image_url.clone() else {
        if record.image_file_name.is_some() {
            fixups.push(Fixup::ImageFileNameWithoutUrl);
        }
        return None;
    };

    let file_name = match record.image_file_name.clone() {
        Some(name) => Some(name),
        None => {
            let recovered = blobs.key_from_url(BlobPrefix::Images, &url);
            fixups.push(if recovered.is_some() {
                Fixup::ImageKeyRecovered
            } else {
                Fixup::ImageKeyUnknown
            });
            recovered
        }
    };
    Some(Thumbnail { url, file_name })
}
