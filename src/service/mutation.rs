//! Post mutation service
//!
//! Each mutation is a short linear sequence: load a snapshot, validate,
//! touch blobs, then write records. Blob uploads and record writes are not
//! transactional together. A failure after an upload reports the uploaded
//! paths through `PostError::Orphaned`. Superseded blobs are deleted after
//! the record write; a failure deleting one is logged and swallowed.

use chrono::Utc;

use crate::blob_store::{BlobBackend, BlobPrefix, BlobStore, StoredBlob};
use crate::observability::{Event, Logger};
use crate::ordering::{
    detect_inconsistency, plan_insert, plan_removal, plan_resequence, position_of, sort_by_rank,
    OrderAssignment,
};
use crate::post::{
    content_fields, field, image_fields, normalize_logged, order_fields, text_fields,
    updated_at_fields, ContentLink, Post, PostRecord, Thumbnail, POSTS_COLLECTION,
};
use crate::record_store::{Fields, RecordError, RecordStore, SortKey};

use super::errors::{PostError, PostResult};
use super::request::{ContentChange, ContentSelector, NewPost, PostEdit, Upload};
use super::validation::{
    validate_external_url, validate_new_post, validate_post_edit, validate_upload_sizes,
    ValidationError,
};

/// Posts in display order
#[derive(Debug, Clone)]
pub struct PostListing {
    pub posts: Vec<Post>,
    /// False when stored ranks do not match display positions
    pub consistent: bool,
}

/// Composes the record store, blob store and ordering engine.
///
/// Holds no list state: every call re-reads the collection.
pub struct PostService<R: RecordStore, B: BlobBackend> {
    records: R,
    blobs: BlobStore<B>,
    collection: String,
}

impl<R: RecordStore, B: BlobBackend> PostService<R, B> {
    pub fn new(records: R, blobs: BlobStore<B>) -> Self {
        Self {
            records,
            blobs,
            collection: POSTS_COLLECTION.to_string(),
        }
    }

    pub fn records(&self) -> &R {
        &self.records
    }

    pub fn blobs(&self) -> &BlobStore<B> {
        &self.blobs
    }

    /// Current snapshot in display order
    pub(crate) fn load(&self) -> PostResult<Vec<Post>> {
        let documents = self.records.list(
            &self.collection,
            &[SortKey::asc(field::ORDER), SortKey::desc(field::CREATED_AT)],
        )?;

        let mut posts = Vec::with_capacity(documents.len());
        for doc in &documents {
            let record = PostRecord::from_document(doc);
            posts.push(normalize_logged(&doc.id, record, &self.blobs));
        }
        sort_by_rank(&mut posts);

        let count = posts.len().to_string();
        Logger::emit(Event::PostsLoaded, &[("count", &count)]);
        Ok(posts)
    }

    fn find(&self, posts: &[Post], id: &str) -> PostResult<Post> {
        posts
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| RecordError::not_found(&self.collection, id).into())
    }

    /// List posts in display order. Never writes.
    pub fn list_posts(&self) -> PostResult<PostListing> {
        let posts = self.load()?;
        let consistent = !detect_inconsistency(&posts);
        if !consistent {
            let count = posts.len().to_string();
            Logger::emit(Event::PostOrderInconsistent, &[("count", &count)]);
        }
        Ok(PostListing { posts, consistent })
    }

    /// A single post by id
    pub fn get_post(&self, id: &str) -> PostResult<Post> {
        let posts = self.load()?;
        self.find(&posts, id)
    }

    /// Add a post at `target_position` (default: append).
    pub fn submit_new_post(&self, request: NewPost) -> PostResult<Post> {
        self.add(request).map_err(|e| report_failure("add", e))
    }

    /// Edit `existing`. The post is re-read by id; `existing` only names it.
    pub fn submit_post_edit(&self, existing: &Post, request: PostEdit) -> PostResult<Post> {
        self.edit(&existing.id, request)
            .map_err(|e| report_failure("edit", e))
    }

    /// Delete `post` and close the gap it leaves.
    pub fn delete_post(&self, post: &Post) -> PostResult<()> {
        self.remove(&post.id).map_err(|e| report_failure("delete", e))
    }

    /// Rewrite every stored rank that differs from its display position.
    /// Returns the number of records rewritten.
    pub fn resequence(&self) -> PostResult<usize> {
        let posts = self.load()?;
        let plan = plan_resequence(&posts);
        let rewritten = plan.len();
        if rewritten > 0 {
            self.records
                .batch_update(&self.collection, order_batch(plan))
                .map_err(|e| report_failure("resequence", e.into()))?;
        }

        let rewritten_str = rewritten.to_string();
        Logger::emit(Event::PostsResequenced, &[("rewritten", &rewritten_str)]);
        Ok(rewritten)
    }

    fn add(&self, request: NewPost) -> PostResult<Post> {
        let current = self.load()?;
        validate_new_post(&request, current.len())?;
        validate_upload_sizes(request.uploads(), self.blobs.max_upload_bytes())?;
        let image = request.image.as_ref().ok_or(ValidationError::MissingImage)?;

        let now = Utc::now();
        let target = request.target_position.unwrap_or(current.len());
        let mut post = Post {
            id: String::new(),
            title: request.title.trim().to_string(),
            description: request.description.trim().to_string(),
            image: None,
            content: None,
            order: Some(target as u32),
            created_at: Some(now),
            updated_at: Some(now),
        };

        // Sibling shifts; the new record's own rank goes in with its create.
        let siblings: Vec<OrderAssignment> = plan_insert(&current, None, &post, target)?
            .into_iter()
            .filter(|a| !a.id.is_empty())
            .collect();

        let content = match &request.content {
            ContentSelector::File(upload) => Pending::File(upload),
            ContentSelector::ExternalUrl(url) => Pending::Url(validate_external_url(url)?),
        };

        let mut uploaded: Vec<String> = Vec::new();
        let image_blob = self.upload(BlobPrefix::Images, image, &uploaded)?;
        uploaded.push(image_blob.path());
        post.image = Some(Thumbnail {
            url: image_blob.url,
            file_name: Some(image_blob.file_name),
        });
        post.content = Some(self.store_content(content, &mut uploaded)?);

        post.id = self
            .records
            .create(&self.collection, post.to_fields())
            .map_err(|e| orphaned(uploaded, e.into()))?;

        // The record now owns its blobs; a failure here only leaves ranks
        // out of step, which the next listing reports and resequence repairs.
        if !siblings.is_empty() {
            self.records
                .batch_update(&self.collection, order_batch(siblings))?;
        }

        let order = target.to_string();
        Logger::emit(
            Event::PostCreated,
            &[("post_id", &post.id), ("order", &order)],
        );
        Ok(post)
    }

    fn edit(&self, id: &str, request: PostEdit) -> PostResult<Post> {
        let current = self.load()?;
        let stored = self.find(&current, id)?;
        validate_post_edit(&request, current.len())?;
        validate_upload_sizes(request.uploads(), self.blobs.max_upload_bytes())?;

        let position = position_of(&current, id).unwrap_or(current.len().saturating_sub(1));
        let target = request.target_position.unwrap_or(position);
        let plan = if target != position {
            plan_insert(&current, Some(id), &stored, target)?
        } else {
            Vec::new()
        };

        let now = Utc::now();
        let mut updated = stored.clone();
        updated.title = request.title.trim().to_string();
        updated.description = request.description.trim().to_string();
        updated.updated_at = Some(now);
        updated.order = Some(target as u32);

        let replacement = match &request.content {
            ContentChange::Keep => None,
            ContentChange::Replace(ContentSelector::ExternalUrl(url)) => {
                let url = validate_external_url(url)?;
                let unchanged = matches!(
                    &stored.content,
                    Some(ContentLink::ExternalUrl { url: old }) if *old == url
                );
                (!unchanged).then_some(Pending::Url(url))
            }
            ContentChange::Replace(ContentSelector::File(upload)) => Some(Pending::File(upload)),
        };

        let mut fields = text_fields(&updated.title, &updated.description);
        fields.extend(updated_at_fields(now));
        let mut uploaded: Vec<String> = Vec::new();
        // Old blobs are deleted only once the record points at the new ones.
        let mut superseded: Vec<(BlobPrefix, &str)> = Vec::new();

        if let Some(image) = &request.image {
            if let Some(old) = stored.image_file_name() {
                superseded.push((BlobPrefix::Images, old));
            }
            let blob = self.upload(BlobPrefix::Images, image, &uploaded)?;
            uploaded.push(blob.path());
            updated.image = Some(Thumbnail {
                url: blob.url,
                file_name: Some(blob.file_name),
            });
            fields.extend(image_fields(updated.image.as_ref()));
        }

        if let Some(pending) = replacement {
            if let Some(old) = stored.content_file_name() {
                superseded.push((BlobPrefix::Files, old));
            }
            let content = self.store_content(pending, &mut uploaded)?;
            fields.extend(content_fields(Some(&content)));
            updated.content = Some(content);
        }

        if plan.is_empty() && stored.order != Some(target as u32) {
            // Not moving, but the stored rank is missing or stale.
            fields.extend(order_fields(target as u32));
        }
        let moved = plan.len();
        let batch = merge_into_batch(order_batch(plan), id, fields);

        self.records
            .batch_update(&self.collection, batch)
            .map_err(|e| orphaned(uploaded, e.into()))?;

        for (prefix, old) in superseded {
            self.cleanup(prefix, old);
        }

        let order = target.to_string();
        let moved = moved.to_string();
        Logger::emit(
            Event::PostUpdated,
            &[("post_id", id), ("order", &order), ("reordered", &moved)],
        );
        Ok(updated)
    }

    fn remove(&self, id: &str) -> PostResult<()> {
        let current = self.load()?;
        let stored = self.find(&current, id)?;

        self.records.delete(&self.collection, id)?;

        if let Some(name) = stored.image_file_name() {
            self.cleanup(BlobPrefix::Images, name);
        }
        if let Some(name) = stored.content_file_name() {
            self.cleanup(BlobPrefix::Files, name);
        }

        let plan = plan_removal(&current, id);
        let shifted = plan.len();
        if shifted > 0 {
            self.records
                .batch_update(&self.collection, order_batch(plan))?;
        }

        let shifted = shifted.to_string();
        Logger::emit(
            Event::PostDeleted,
            &[("post_id", id), ("reordered", &shifted)],
        );
        Ok(())
    }

    /// Upload one file; a failure reports blobs uploaded earlier in the same
    /// mutation as orphaned.
    fn upload(
        &self,
        prefix: BlobPrefix,
        upload: &Upload,
        uploaded: &[String],
    ) -> PostResult<StoredBlob> {
        let blob = self
            .blobs
            .upload_to(prefix, &upload.file_name, &upload.bytes)
            .map_err(|e| orphaned(uploaded.to_vec(), e.into()))?;

        let path = blob.path();
        let size = upload.bytes.len().to_string();
        Logger::emit(Event::BlobUploaded, &[("path", &path), ("size", &size)]);
        Ok(blob)
    }

    /// Upload file content or pass a URL through
    fn store_content(
        &self,
        pending: Pending<'_>,
        uploaded: &mut Vec<String>,
    ) -> PostResult<ContentLink> {
        match pending {
            Pending::Url(url) => Ok(ContentLink::ExternalUrl { url }),
            Pending::File(upload) => {
                let blob = self.upload(BlobPrefix::Files, upload, uploaded)?;
                uploaded.push(blob.path());
                Ok(ContentLink::File {
                    url: blob.url,
                    file_name: blob.file_name,
                })
            }
        }
    }

    /// Best-effort delete of a superseded blob
    pub(crate) fn cleanup(&self, prefix: BlobPrefix, file_name: &str) {
        let path = prefix.path(file_name);
        if let Err(e) = self.blobs.delete(&path) {
            Logger::emit(
                Event::BlobCleanupFailed,
                &[("path", &path), ("error", &e.to_string())],
            );
        }
    }
}

/// Content replacement resolved before any blob is touched
enum Pending<'a> {
    Url(String),
    File(&'a Upload),
}

fn order_batch(plan: Vec<OrderAssignment>) -> Vec<(String, Fields)> {
    plan.into_iter()
        .map(|a| (a.id, order_fields(a.order)))
        .collect()
}

/// Fold a record's own field updates into the order batch.
fn merge_into_batch(
    mut batch: Vec<(String, Fields)>,
    id: &str,
    fields: Fields,
) -> Vec<(String, Fields)> {
    match batch.iter_mut().find(|(batch_id, _)| batch_id == id) {
        Some((_, existing)) => existing.extend(fields),
        None => batch.push((id.to_string(), fields)),
    }
    batch
}

fn orphaned(blobs: Vec<String>, error: PostError) -> PostError {
    if blobs.is_empty() {
        return error;
    }
    let reason = error.to_string();
    for path in &blobs {
        Logger::emit(Event::BlobOrphaned, &[("path", path), ("error", &reason)]);
    }
    PostError::Orphaned {
        blobs,
        source: Box::new(error),
    }
}

fn report_failure(operation: &str, error: PostError) -> PostError {
    if !matches!(error, PostError::Validation(_)) {
        Logger::emit(
            Event::PostMutationFailed,
            &[
                ("code", error.code()),
                ("error", &error.to_string()),
                ("operation", operation),
            ],
        );
    }
    error
}
