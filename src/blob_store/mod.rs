//! # Blob Store
//!
//! Binary storage for post thumbnails and uploaded content.
//!
//! Objects are addressed by slash-separated keys under two prefixes
//! (`post_images/`, `post_files/`). Every stored object is reachable through
//! a URL of the form `{public_base_url}/blobs/{path}?token=...`; the token is
//! bound to the path so URLs cannot be forged for other objects.

mod backend;
mod client;
mod errors;
mod local;
mod memory;
mod token;

pub use backend::{validate_path, BlobBackend};
pub use client::{sanitize_file_name, BlobPrefix, BlobStore, StoredBlob, BLOB_ROUTE};
pub use errors::{BlobError, BlobResult};
pub use local::LocalBackend;
pub use memory::MemoryBackend;
pub use token::DownloadTokens;
