//! Post domain model

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::ordering::Ranked;

/// A card on the page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Post {
    pub id: String,
    pub title: String,
    pub description: String,
    pub image: Option<Thumbnail>,
    pub content: Option<ContentLink>,
    pub order: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Card thumbnail
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Thumbnail {
    pub url: String,
    /// Key under `post_images/`; `None` when a legacy URL could not be traced
    /// back to a blob, in which case the image is never deleted
    pub file_name: Option<String>,
}

/// What the card links to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ContentLink {
    /// Uploaded file owned by the blob store
    File {
        url: String,
        #[serde(rename = "fileName")]
        file_name: String,
    },
    /// Link supplied by the operator; never deleted
    ExternalUrl { url: String },
}

impl ContentLink {
    pub fn url(&self) -> &str {
        match self {
            ContentLink::File { url, .. } => url,
            ContentLink::ExternalUrl { url } => url,
        }
    }

    /// Blob key, only for file-backed content
    pub fn file_name(&self) -> Option<&str> {
        match self {
            ContentLink::File { file_name, .. } => Some(file_name),
            ContentLink::ExternalUrl { .. } => None,
        }
    }

    pub fn is_external(&self) -> bool {
        matches!(self, ContentLink::ExternalUrl { .. })
    }
}

impl Post {
    /// Image blob key, if this post owns one
    pub fn image_file_name(&self) -> Option<&str> {
        self.image.as_ref().and_then(|t| t.file_name.as_deref())
    }

    /// Content blob key, if the content is file-backed
    pub fn content_file_name(&self) -> Option<&str> {
        self.content.as_ref().and_then(ContentLink::file_name)
    }
}

impl Ranked for Post {
    fn id(&self) -> &str {
        &self.id
    }

    fn stored_order(&self) -> Option<u32> {
        self.order
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}
