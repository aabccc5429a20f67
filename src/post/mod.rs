//! # Posts
//!
//! The domain model (`Post`, `Thumbnail`, `ContentLink`), its flat persisted
//! shape and the load-time normalization of older rows.

mod model;
mod normalize;
mod record;

pub use model::{ContentLink, Post, Thumbnail};
pub use normalize::{normalize, normalize_logged, Fixup, Normalized};
pub use record::{
    content_fields, field, image_fields, order_fields, text_fields, updated_at_fields, PostRecord,
    POSTS_COLLECTION,
};
