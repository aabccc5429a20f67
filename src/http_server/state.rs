//! Shared handler state

use tokio::sync::Mutex;

use crate::blob_store::BlobBackend;
use crate::record_store::RecordStore;
use crate::service::PostService;

/// The post service behind one lock. Requests are handled one at a time,
/// so no two rank recomputations ever interleave.
pub struct AppState<R: RecordStore, B: BlobBackend> {
    pub service: Mutex<PostService<R, B>>,
}

impl<R: RecordStore, B: BlobBackend> AppState<R, B> {
    pub fn new(service: PostService<R, B>) -> Self {
        Self {
            service: Mutex::new(service),
        }
    }
}
