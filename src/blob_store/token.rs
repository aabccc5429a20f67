//! # Download Tokens
//!
//! A blob URL carries a token bound to the blob path. Tokens do not expire:
//! the URL is persisted inside post records and must stay valid for as long
//! as the blob exists. Rotating the secret invalidates every stored URL.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use super::errors::{BlobError, BlobResult};

/// Issues and verifies path-bound download tokens
#[derive(Clone)]
pub struct DownloadTokens {
    secret: Vec<u8>,
}

impl std::fmt::Debug for DownloadTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadTokens").finish_non_exhaustive()
    }
}

impl DownloadTokens {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            secret: secret.to_vec(),
        }
    }

    /// Token for `path`
    pub fn issue(&self, path: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.secret);
        hasher.update(b"\0");
        hasher.update(path.as_bytes());
        URL_SAFE_NO_PAD.encode(hasher.finalize())
    }

    /// Check `token` against `path` in constant time
    pub fn verify(&self, path: &str, token: &str) -> BlobResult<()> {
        let expected = self.issue(path);
        if expected.as_bytes().ct_eq(token.as_bytes()).into() {
            Ok(())
        } else {
            Err(BlobError::InvalidToken)
        }
    }
}
