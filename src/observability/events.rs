//! Observable events
//!
//! Every log line carries one of these. The string form is the stable name
//! operators grep for.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Lifecycle
    BootStart,
    ConfigLoaded,
    ServerListening,
    DataDirInitialized,

    // Loading
    PostsLoaded,
    /// Stored ranks do not match display positions
    PostOrderInconsistent,
    /// A legacy row was mapped onto the current model
    PostRecordNormalized,

    // Mutations
    PostCreated,
    PostUpdated,
    PostDeleted,
    PostsResequenced,
    PostMutationFailed,

    // Blobs
    BlobUploaded,
    /// Best-effort deletion failed; the blob stays behind
    BlobCleanupFailed,
    /// Uploaded blob left unreferenced after a failed mutation
    BlobOrphaned,
    BlobSwept,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::BootStart => "FOLIO_STARTUP_BEGIN",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::ServerListening => "SERVER_LISTENING",
            Event::DataDirInitialized => "DATA_DIR_INITIALIZED",

            Event::PostsLoaded => "POSTS_LOADED",
            Event::PostOrderInconsistent => "POST_ORDER_INCONSISTENT",
            Event::PostRecordNormalized => "POST_RECORD_NORMALIZED",

            Event::PostCreated => "POST_CREATED",
            Event::PostUpdated => "POST_UPDATED",
            Event::PostDeleted => "POST_DELETED",
            Event::PostsResequenced => "POSTS_RESEQUENCED",
            Event::PostMutationFailed => "POST_MUTATION_FAILED",

            Event::BlobUploaded => "BLOB_UPLOADED",
            Event::BlobCleanupFailed => "BLOB_CLEANUP_FAILED",
            Event::BlobOrphaned => "BLOB_ORPHANED",
            Event::BlobSwept => "BLOB_SWEPT",
        }
    }

    /// Default severity used by `Logger::emit`.
    pub fn severity(&self) -> Severity {
        match self {
            Event::PostsLoaded | Event::BlobUploaded => Severity::Trace,
            Event::PostOrderInconsistent
            | Event::PostRecordNormalized
            | Event::BlobCleanupFailed
            | Event::BlobOrphaned => Severity::Warn,
            Event::PostMutationFailed => Severity::Error,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
