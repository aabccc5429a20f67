//! # Blob Store Client
//!
//! Upload-and-get-url and delete-by-name over a `BlobBackend`, under the two
//! logical prefixes posts use: `post_images/` for card thumbnails and
//! `post_files/` for uploaded content.

use std::sync::OnceLock;

use chrono::Utc;
use regex::Regex;

use super::backend::BlobBackend;
use super::errors::{BlobError, BlobResult};
use super::token::DownloadTokens;

/// Route segment under which blobs are served
pub const BLOB_ROUTE: &str = "blobs";

const MAX_NAME_LEN: usize = 100;

/// Logical blob namespaces
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlobPrefix {
    /// Card thumbnails
    Images,
    /// Uploaded post content
    Files,
}

impl BlobPrefix {
    pub const ALL: [BlobPrefix; 2] = [BlobPrefix::Images, BlobPrefix::Files];

    pub fn as_str(&self) -> &'static str {
        match self {
            BlobPrefix::Images => "post_images",
            BlobPrefix::Files => "post_files",
        }
    }

    /// Full blob path for a stored file name
    pub fn path(&self, file_name: &str) -> String {
        format!("{}/{}", self.as_str(), file_name)
    }
}

/// A blob that was just written
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredBlob {
    pub prefix: BlobPrefix,
    /// Storage key within the prefix, kept on the record for later deletion
    pub file_name: String,
    pub url: String,
}

impl StoredBlob {
    pub fn path(&self) -> String {
        self.prefix.path(&self.file_name)
    }
}

/// Blob store client
#[derive(Debug)]
pub struct BlobStore<B: BlobBackend> {
    backend: B,
    tokens: DownloadTokens,
    public_base_url: String,
    max_upload_bytes: u64,
}

impl<B: BlobBackend> BlobStore<B> {
    pub fn new(
        backend: B,
        tokens: DownloadTokens,
        public_base_url: &str,
        max_upload_bytes: u64,
    ) -> Self {
        Self {
            backend,
            tokens,
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
            max_upload_bytes,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn max_upload_bytes(&self) -> u64 {
        self.max_upload_bytes
    }

    /// Write `bytes` at `path`
    pub fn upload(&self, path: &str, bytes: &[u8]) -> BlobResult<()> {
        let size = bytes.len() as u64;
        if self.max_upload_bytes > 0 && size > self.max_upload_bytes {
            return Err(BlobError::FileTooLarge(size, self.max_upload_bytes));
        }
        self.backend.write(path, bytes)
    }

    /// Retrievable URL for `path`
    pub fn url(&self, path: &str) -> String {
        format!(
            "{}/{}/{}?token={}",
            self.public_base_url,
            BLOB_ROUTE,
            path,
            self.tokens.issue(path)
        )
    }

    /// Delete the blob at `path`; `ObjectNotFound` if it is already gone
    pub fn delete(&self, path: &str) -> BlobResult<()> {
        self.backend.delete(path)
    }

    /// Read a blob on behalf of a URL holder
    pub fn read_verified(&self, path: &str, token: &str) -> BlobResult<Vec<u8>> {
        self.tokens.verify(path, token)?;
        self.backend.read(path)
    }

    /// Every blob path under `prefix`
    pub fn list(&self, prefix: BlobPrefix) -> BlobResult<Vec<String>> {
        self.backend.list(prefix.as_str())
    }

    /// Store `bytes` under a fresh `{unix_millis}-{name}` key and resolve its URL.
    pub fn upload_to(
        &self,
        prefix: BlobPrefix,
        original_name: &str,
        bytes: &[u8],
    ) -> BlobResult<StoredBlob> {
        let name = sanitize_file_name(original_name);
        let mut stamp = Utc::now().timestamp_millis();
        let mut file_name = format!("{}-{}", stamp, name);
        while self.backend.exists(&prefix.path(&file_name))? {
            stamp += 1;
            file_name = format!("{}-{}", stamp, name);
        }

        let path = prefix.path(&file_name);
        self.upload(&path, bytes)?;
        Ok(StoredBlob {
            prefix,
            url: self.url(&path),
            file_name,
        })
    }

    /// Recover the storage key from a URL this store issued.
    ///
    /// Returns `None` for foreign URLs, other prefixes, or a token that does
    /// not match; such URLs are never treated as deletable blobs.
    pub fn key_from_url(&self, prefix: BlobPrefix, url: &str) -> Option<String> {
        let root = format!("{}/{}/", self.public_base_url, BLOB_ROUTE);
        let rest = url.strip_prefix(&root)?;
        let (path, query) = rest.split_once('?').unwrap_or((rest, ""));
        let token = query
            .split('&')
            .find_map(|pair| pair.strip_prefix("token="))?;
        self.tokens.verify(path, token).ok()?;

        let file_name = path.strip_prefix(prefix.as_str())?.strip_prefix('/')?;
        if file_name.is_empty() || file_name.contains('/') {
            return None;
        }
        Some(file_name.to_string())
    }
}

/// Reduce an uploaded file name to a safe single path segment.
pub fn sanitize_file_name(name: &str) -> String {
    static UNSAFE: OnceLock<Regex> = OnceLock::new();
    let unsafe_chars = UNSAFE.get_or_init(|| {
        Regex::new(r"[^A-Za-z0-9._-]+").unwrap_or_else(|_| unreachable!("static pattern"))
    });

    // Browsers may send a full client path.
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned = unsafe_chars.replace_all(base.trim(), "_");
    let cleaned = cleaned.trim_matches('.');
    let mut out: String = cleaned.chars().take(MAX_NAME_LEN).collect();
    if out.is_empty() {
        out.push_str("file");
    }
    out
}
