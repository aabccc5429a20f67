//! Post Lifecycle Tests
//!
//! End-to-end add / edit / delete against the on-disk stores, plus the
//! failure paths where blob uploads and record writes drift apart:
//! - a record write failing after uploads reports the uploaded blobs
//! - a superseded blob that cannot be deleted never fails the mutation
//! - the sweep reclaims whatever a failed mutation left behind

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

use folio::blob_store::{
    BlobBackend, BlobError, BlobPrefix, BlobResult, BlobStore, DownloadTokens, LocalBackend,
    MemoryBackend,
};
use folio::post::{field, ContentLink, Post, POSTS_COLLECTION};
use folio::record_store::{
    Document, Fields, JsonFileRecordStore, MemoryRecordStore, RecordError, RecordResult,
    RecordStore, SortKey,
};
use folio::service::{
    ContentChange, ContentSelector, NewPost, PostEdit, PostError, PostService, Upload,
};
use serde_json::json;
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

const BASE_URL: &str = "http://127.0.0.1:54321";

type DiskService = PostService<JsonFileRecordStore, LocalBackend>;

fn open_disk(dir: &Path) -> DiskService {
    let records = JsonFileRecordStore::open(dir.join("collections")).unwrap();
    let blobs = BlobStore::new(
        LocalBackend::new(dir.join("blobs")),
        DownloadTokens::new(b"lifecycle-secret"),
        BASE_URL,
        1024 * 1024,
    );
    PostService::new(records, blobs)
}

fn file_post(title: &str, position: Option<usize>) -> NewPost {
    NewPost {
        title: title.to_string(),
        description: format!("{} description", title),
        image: Some(Upload::new(format!("{}.png", title), b"png-bytes".to_vec())),
        content: ContentSelector::File(Upload::new(format!("{}.pdf", title), b"pdf".to_vec())),
        target_position: position,
    }
}

fn link_post(title: &str, position: Option<usize>) -> NewPost {
    NewPost {
        content: ContentSelector::ExternalUrl(format!("https://example.com/{}", title)),
        ..file_post(title, position)
    }
}

fn edit_of(post: &Post) -> PostEdit {
    PostEdit {
        title: post.title.clone(),
        description: post.description.clone(),
        image: None,
        content: ContentChange::Keep,
        target_position: None,
    }
}

fn titles<R: RecordStore, B: BlobBackend>(service: &PostService<R, B>) -> Vec<String> {
    service
        .list_posts()
        .unwrap()
        .posts
        .into_iter()
        .map(|p| p.title)
        .collect()
}

fn stored_orders<R: RecordStore, B: BlobBackend>(service: &PostService<R, B>) -> Vec<Option<u32>> {
    service
        .list_posts()
        .unwrap()
        .posts
        .into_iter()
        .map(|p| p.order)
        .collect()
}

fn token_of(url: &str) -> &str {
    url.split_once("token=").map(|(_, t)| t).unwrap_or_default()
}

/// Record store whose writes can be switched off
struct FlakyRecords {
    inner: MemoryRecordStore,
    fail_writes: AtomicBool,
}

impl FlakyRecords {
    fn new() -> Self {
        Self {
            inner: MemoryRecordStore::new(),
            fail_writes: AtomicBool::new(false),
        }
    }

    fn check(&self) -> RecordResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(RecordError::Io("disk unavailable".into()))
        } else {
            Ok(())
        }
    }
}

impl RecordStore for FlakyRecords {
    fn list(&self, collection: &str, sort: &[SortKey]) -> RecordResult<Vec<Document>> {
        self.inner.list(collection, sort)
    }

    fn get(&self, collection: &str, id: &str) -> RecordResult<Document> {
        self.inner.get(collection, id)
    }

    fn create(&self, collection: &str, fields: Fields) -> RecordResult<String> {
        self.check()?;
        self.inner.create(collection, fields)
    }

    fn update(&self, collection: &str, id: &str, fields: Fields) -> RecordResult<()> {
        self.check()?;
        self.inner.update(collection, id, fields)
    }

    fn delete(&self, collection: &str, id: &str) -> RecordResult<()> {
        self.check()?;
        self.inner.delete(collection, id)
    }

    fn batch_update(&self, collection: &str, updates: Vec<(String, Fields)>) -> RecordResult<()> {
        self.check()?;
        self.inner.batch_update(collection, updates)
    }
}

/// Blob backend that refuses every delete
#[derive(Debug)]
struct UndeletableBlobs(MemoryBackend);

impl BlobBackend for UndeletableBlobs {
    fn write(&self, path: &str, data: &[u8]) -> BlobResult<()> {
        self.0.write(path, data)
    }

    fn read(&self, path: &str) -> BlobResult<Vec<u8>> {
        self.0.read(path)
    }

    fn delete(&self, _path: &str) -> BlobResult<()> {
        Err(BlobError::Io("permission denied".into()))
    }

    fn exists(&self, path: &str) -> BlobResult<bool> {
        self.0.exists(path)
    }

    fn list(&self, prefix: &str) -> BlobResult<Vec<String>> {
        self.0.list(prefix)
    }
}

fn memory_blobs<B: BlobBackend>(backend: B) -> BlobStore<B> {
    BlobStore::new(
        backend,
        DownloadTokens::new(b"lifecycle-secret"),
        BASE_URL,
        1024 * 1024,
    )
}

// =============================================================================
// On-disk lifecycle
// =============================================================================

#[test]
fn test_posts_survive_reopen() {
    let temp = TempDir::new().unwrap();

    let created = {
        let service = open_disk(temp.path());
        service.submit_new_post(link_post("first", None)).unwrap();
        service.submit_new_post(file_post("second", Some(0))).unwrap()
    };

    let service = open_disk(temp.path());
    let listing = service.list_posts().unwrap();
    assert!(listing.consistent);
    assert_eq!(titles(&service), vec!["second", "first"]);
    assert_eq!(stored_orders(&service), vec![Some(0), Some(1)]);

    let reloaded = &listing.posts[0];
    assert_eq!(reloaded.id, created.id);
    assert_eq!(reloaded.content, created.content);
    assert_eq!(reloaded.image, created.image);
}

#[test]
fn test_uploaded_content_is_retrievable_by_url() {
    let temp = TempDir::new().unwrap();
    let service = open_disk(temp.path());

    let post = service.submit_new_post(file_post("doc", None)).unwrap();
    let Some(ContentLink::File { url, file_name }) = &post.content else {
        panic!("expected file content, got {:?}", post.content);
    };
    assert!(file_name.ends_with("-doc.pdf"));
    assert!(temp.path().join("blobs/post_files").join(file_name).is_file());

    let path = BlobPrefix::Files.path(file_name);
    let bytes = service.blobs().read_verified(&path, token_of(url)).unwrap();
    assert_eq!(bytes, b"pdf");

    assert!(matches!(
        service.blobs().read_verified(&path, "forged"),
        Err(BlobError::InvalidToken)
    ));
}

#[test]
fn test_replace_content_file_with_link() {
    let temp = TempDir::new().unwrap();
    let service = open_disk(temp.path());
    let post = service.submit_new_post(file_post("doc", None)).unwrap();
    let old_file = post.content_file_name().unwrap().to_string();

    let mut edit = edit_of(&post);
    edit.content = ContentChange::Replace(ContentSelector::ExternalUrl(
        "https://example.com/moved".into(),
    ));
    let updated = service.submit_post_edit(&post, edit).unwrap();

    assert_eq!(
        updated.content,
        Some(ContentLink::ExternalUrl {
            url: "https://example.com/moved".into()
        })
    );
    assert!(!temp.path().join("blobs/post_files").join(&old_file).exists());
    assert_eq!(service.blobs().list(BlobPrefix::Files).unwrap(), Vec::<String>::new());

    // The image was not part of the edit.
    let image = post.image_file_name().unwrap();
    assert!(temp.path().join("blobs/post_images").join(image).is_file());
}

#[test]
fn test_replace_image_keeps_content() {
    let temp = TempDir::new().unwrap();
    let service = open_disk(temp.path());
    let post = service.submit_new_post(file_post("pic", None)).unwrap();
    let old_image = post.image_file_name().unwrap().to_string();

    let mut edit = edit_of(&post);
    edit.image = Some(Upload::new("fresh.png", b"new-png".to_vec()));
    let updated = service.submit_post_edit(&post, edit).unwrap();

    let new_image = updated.image_file_name().unwrap();
    assert_ne!(new_image, old_image);
    assert!(new_image.ends_with("-fresh.png"));
    assert_eq!(updated.content, post.content);
    assert_eq!(
        service.blobs().list(BlobPrefix::Images).unwrap(),
        vec![BlobPrefix::Images.path(new_image)]
    );
}

#[test]
fn test_delete_removes_blobs_and_closes_gap() {
    let temp = TempDir::new().unwrap();
    let service = open_disk(temp.path());
    for title in ["a", "b", "c"] {
        service.submit_new_post(file_post(title, None)).unwrap();
    }
    let listing = service.list_posts().unwrap();
    let middle = listing.posts[1].clone();

    service.delete_post(&middle).unwrap();

    assert_eq!(titles(&service), vec!["a", "c"]);
    assert_eq!(stored_orders(&service), vec![Some(0), Some(1)]);
    assert_eq!(service.blobs().list(BlobPrefix::Images).unwrap().len(), 2);
    assert_eq!(service.blobs().list(BlobPrefix::Files).unwrap().len(), 2);

    let err = service.delete_post(&middle).unwrap_err();
    assert_eq!(err.status_code(), 404);
}

// =============================================================================
// Legacy rows
// =============================================================================

#[test]
fn test_legacy_rows_listed_then_resequenced() {
    let temp = TempDir::new().unwrap();
    let service = open_disk(temp.path());

    let legacy = |title: &str, created_at: &str| -> Fields {
        let mut fields = Fields::new();
        fields.insert(field::TITLE.into(), json!(title));
        fields.insert(field::DESCRIPTION.into(), json!("imported"));
        fields.insert(field::FILE_URL.into(), json!("https://legacy.example.com/doc"));
        fields.insert(field::CREATED_AT.into(), json!(created_at));
        fields
    };
    let records = service.records();
    records
        .create(POSTS_COLLECTION, legacy("older", "2023-01-01T00:00:00Z"))
        .unwrap();
    records
        .create(POSTS_COLLECTION, legacy("newer", "2024-01-01T00:00:00Z"))
        .unwrap();

    let listing = service.list_posts().unwrap();
    assert!(!listing.consistent);
    assert_eq!(titles(&service), vec!["newer", "older"]);
    assert!(listing.posts.iter().all(|p| p.content
        == Some(ContentLink::ExternalUrl {
            url: "https://legacy.example.com/doc".into()
        })));

    assert_eq!(service.resequence().unwrap(), 2);
    let listing = service.list_posts().unwrap();
    assert!(listing.consistent);
    assert_eq!(titles(&service), vec!["newer", "older"]);
    assert_eq!(service.resequence().unwrap(), 0);

    // New posts append after the repaired rows.
    service.submit_new_post(link_post("fresh", None)).unwrap();
    assert_eq!(titles(&service), vec!["newer", "older", "fresh"]);
}

#[test]
fn test_unreadable_row_does_not_block_neighbours() {
    let temp = TempDir::new().unwrap();
    let service = open_disk(temp.path());
    let healthy = service.submit_new_post(file_post("healthy", None)).unwrap();

    let mut broken = Fields::new();
    broken.insert(field::TITLE.into(), json!("broken"));
    broken.insert(field::DESCRIPTION.into(), json!("hand edited"));
    broken.insert(field::CREATED_AT.into(), json!("last tuesday"));
    broken.insert(field::IS_EXTERNAL_LINK.into(), json!("yes"));
    broken.insert(field::ORDER.into(), json!(1));
    service.records().create(POSTS_COLLECTION, broken).unwrap();

    let listing = service.list_posts().unwrap();
    assert_eq!(titles(&service), vec!["healthy", "broken"]);
    assert_eq!(listing.posts[1].created_at, None);

    service.delete_post(&healthy).unwrap();
    assert_eq!(titles(&service), vec!["broken"]);
    assert_eq!(stored_orders(&service), vec![Some(0)]);

    service.submit_new_post(link_post("fresh", Some(0))).unwrap();
    assert_eq!(titles(&service), vec!["fresh", "broken"]);
}

// =============================================================================
// Partial failures
// =============================================================================

#[test]
fn test_failed_create_reports_orphans_then_sweep_reclaims() {
    let service = PostService::new(FlakyRecords::new(), memory_blobs(MemoryBackend::new()));
    service.submit_new_post(link_post("kept", None)).unwrap();

    service.records().fail_writes.store(true, Ordering::SeqCst);
    let err = service.submit_new_post(file_post("lost", None)).unwrap_err();
    assert_eq!(err.status_code(), 500);
    assert_eq!(err.code(), "RECORD_STORE_ERROR");

    let orphaned = err.orphaned_blobs().to_vec();
    assert_eq!(orphaned.len(), 2);
    assert!(orphaned[0].starts_with("post_images/"));
    assert!(orphaned[1].starts_with("post_files/"));
    assert!(matches!(err, PostError::Orphaned { .. }));
    service.records().fail_writes.store(false, Ordering::SeqCst);

    assert_eq!(titles(&service), vec!["kept"]);

    let dry = service.sweep_orphaned_blobs(true).unwrap();
    let mut found = dry.orphaned.clone();
    found.sort();
    let mut expected = orphaned.clone();
    expected.sort();
    assert_eq!(found, expected);
    assert!(dry.deleted.is_empty());

    let swept = service.sweep_orphaned_blobs(false).unwrap();
    assert_eq!(swept.deleted.len(), 2);
    assert_eq!(service.blobs().backend().len(), 1);
    assert!(service.sweep_orphaned_blobs(true).unwrap().orphaned.is_empty());
}

#[test]
fn test_failed_edit_reports_new_upload() {
    let service = PostService::new(FlakyRecords::new(), memory_blobs(MemoryBackend::new()));
    let post = service.submit_new_post(link_post("a", None)).unwrap();

    service.records().fail_writes.store(true, Ordering::SeqCst);
    let mut edit = edit_of(&post);
    edit.title = "renamed".into();
    edit.content = ContentChange::Replace(ContentSelector::File(Upload::new(
        "new.pdf",
        b"pdf".to_vec(),
    )));
    let err = service.submit_post_edit(&post, edit).unwrap_err();

    let orphaned = err.orphaned_blobs();
    assert_eq!(orphaned.len(), 1);
    assert!(orphaned[0].starts_with("post_files/"));
    assert!(orphaned[0].ends_with("-new.pdf"));

    service.records().fail_writes.store(false, Ordering::SeqCst);
    assert_eq!(titles(&service), vec!["a"]);
}

#[test]
fn test_oversized_edit_keeps_current_files() {
    let temp = TempDir::new().unwrap();
    let service = open_disk(temp.path());
    let post = service.submit_new_post(file_post("kept", None)).unwrap();
    let image_path = temp
        .path()
        .join("blobs/post_images")
        .join(post.image_file_name().unwrap());
    let file_path = temp
        .path()
        .join("blobs/post_files")
        .join(post.content_file_name().unwrap());
    let oversized = vec![0u8; 1024 * 1024 + 1];

    let mut edit = edit_of(&post);
    edit.title = "renamed".into();
    edit.image = Some(Upload::new("huge.png", oversized.clone()));
    let err = service.submit_post_edit(&post, edit).unwrap_err();
    assert_eq!(err.status_code(), 413);
    assert_eq!(err.code(), "FILE_TOO_LARGE");
    assert!(err.orphaned_blobs().is_empty());

    let mut edit = edit_of(&post);
    edit.content = ContentChange::Replace(ContentSelector::File(Upload::new(
        "huge.pdf",
        oversized,
    )));
    let err = service.submit_post_edit(&post, edit).unwrap_err();
    assert_eq!(err.status_code(), 413);

    assert!(image_path.is_file());
    assert!(file_path.is_file());
    assert_eq!(std::fs::read_dir(temp.path().join("blobs/post_images")).unwrap().count(), 1);
    assert_eq!(std::fs::read_dir(temp.path().join("blobs/post_files")).unwrap().count(), 1);
    let reread = service.get_post(&post.id).unwrap();
    assert_eq!(reread.title, "kept");
    assert_eq!(reread.image, post.image);
    assert_eq!(reread.content, post.content);
}

#[test]
fn test_failed_edit_keeps_superseded_image() {
    let service = PostService::new(FlakyRecords::new(), memory_blobs(MemoryBackend::new()));
    let post = service.submit_new_post(file_post("a", None)).unwrap();
    let old_image = BlobPrefix::Images.path(post.image_file_name().unwrap());

    service.records().fail_writes.store(true, Ordering::SeqCst);
    let mut edit = edit_of(&post);
    edit.image = Some(Upload::new("new.png", b"png".to_vec()));
    service.submit_post_edit(&post, edit).unwrap_err();

    assert!(service.blobs().backend().exists(&old_image).unwrap());
}

#[test]
fn test_validation_failure_touches_nothing() {
    let service = PostService::new(FlakyRecords::new(), memory_blobs(MemoryBackend::new()));

    let mut request = file_post("bad", None);
    request.title = "  ".into();
    let err = service.submit_new_post(request).unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert!(err.orphaned_blobs().is_empty());
    assert!(service.blobs().backend().is_empty());

    let mut request = file_post("bad", Some(5));
    request.content = ContentSelector::ExternalUrl("ftp://example.com/x".into());
    assert_eq!(service.submit_new_post(request).unwrap_err().status_code(), 400);
    assert!(service.blobs().backend().is_empty());
}

#[test]
fn test_cleanup_failure_is_swallowed() {
    let service = PostService::new(
        MemoryRecordStore::new(),
        memory_blobs(UndeletableBlobs(MemoryBackend::new())),
    );
    let post = service.submit_new_post(file_post("stuck", None)).unwrap();

    let mut edit = edit_of(&post);
    edit.image = Some(Upload::new("other.png", b"png".to_vec()));
    let updated = service.submit_post_edit(&post, edit).unwrap();
    assert_ne!(updated.image, post.image);

    service.delete_post(&updated).unwrap();
    assert!(service.list_posts().unwrap().posts.is_empty());

    // Everything left behind shows up in a sweep, and still cannot be deleted.
    let report = service.sweep_orphaned_blobs(false).unwrap();
    assert_eq!(report.orphaned.len(), 3);
    assert!(report.deleted.is_empty());
}
