//! Orphaned blob sweep
//!
//! Reclaims blobs that no post references, such as uploads left behind by a
//! mutation that failed after uploading (`PostError::Orphaned`).

use std::collections::HashSet;

use serde::Serialize;

use crate::blob_store::{BlobBackend, BlobPrefix};
use crate::observability::{Event, Logger};
use crate::post::ContentLink;
use crate::record_store::RecordStore;

use super::errors::PostResult;
use super::mutation::PostService;

/// Outcome of a sweep
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    /// Unreferenced blob paths found
    pub orphaned: Vec<String>,
    /// Paths actually deleted; empty on a dry run
    pub deleted: Vec<String>,
}

impl<R: RecordStore, B: BlobBackend> PostService<R, B> {
    /// Delete every blob under the post prefixes that no post references.
    ///
    /// With `dry_run` nothing is deleted. Individual delete failures are
    /// logged and skipped.
    pub fn sweep_orphaned_blobs(&self, dry_run: bool) -> PostResult<SweepReport> {
        let posts = self.load()?;

        let mut referenced: HashSet<String> = HashSet::new();
        for post in &posts {
            if let Some(name) = post.image_file_name() {
                referenced.insert(BlobPrefix::Images.path(name));
            }
            match &post.content {
                Some(ContentLink::File { file_name, .. }) => {
                    referenced.insert(BlobPrefix::Files.path(file_name));
                }
                // A legacy row may mark one of our own URLs as external.
                Some(ContentLink::ExternalUrl { url }) => {
                    if let Some(name) = self.blobs().key_from_url(BlobPrefix::Files, url) {
                        referenced.insert(BlobPrefix::Files.path(&name));
                    }
                }
                None => {}
            }
        }

        let mut report = SweepReport::default();
        for prefix in BlobPrefix::ALL {
            for path in self.blobs().list(prefix)? {
                if !referenced.contains(&path) {
                    report.orphaned.push(path);
                }
            }
        }

        if dry_run {
            return Ok(report);
        }

        for path in &report.orphaned {
            match self.blobs().delete(path) {
                Ok(()) => {
                    Logger::emit(Event::BlobSwept, &[("path", path)]);
                    report.deleted.push(path.clone());
                }
                Err(e) => Logger::emit(
                    Event::BlobCleanupFailed,
                    &[("path", path), ("error", &e.to_string())],
                ),
            }
        }
        Ok(report)
    }
}
