//! Post HTTP Routes

use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use serde::Serialize;

use crate::blob_store::BlobBackend;
use crate::post::Post;
use crate::record_store::RecordStore;
use crate::service::PostError;

use super::form::PostForm;
use super::state::AppState;

#[derive(Debug, Serialize)]
pub struct PostsListResponse {
    pub posts: Vec<Post>,
    pub total: usize,
    /// False when stored ranks disagree with display positions
    pub consistent: bool,
}

#[derive(Debug, Serialize)]
pub struct ResequenceResponse {
    pub rewritten: usize,
}

/// Create post routes
pub fn post_routes<R, B>(state: Arc<AppState<R, B>>) -> Router
where
    R: RecordStore + 'static,
    B: BlobBackend + 'static,
{
    Router::new()
        .route(
            "/posts",
            get(list_posts_handler::<R, B>).post(create_post_handler::<R, B>),
        )
        .route("/posts/resequence", post(resequence_handler::<R, B>))
        .route(
            "/posts/:id",
            put(update_post_handler::<R, B>).delete(delete_post_handler::<R, B>),
        )
        .with_state(state)
}

async fn list_posts_handler<R, B>(
    State(state): State<Arc<AppState<R, B>>>,
) -> Result<Json<PostsListResponse>, PostError>
where
    R: RecordStore + 'static,
    B: BlobBackend + 'static,
{
    let service = state.service.lock().await;
    let listing = service.list_posts()?;

    Ok(Json(PostsListResponse {
        total: listing.posts.len(),
        consistent: listing.consistent,
        posts: listing.posts,
    }))
}

async fn create_post_handler<R, B>(
    State(state): State<Arc<AppState<R, B>>>,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Post>), PostError>
where
    R: RecordStore + 'static,
    B: BlobBackend + 'static,
{
    let request = PostForm::read(multipart).await?.into_new_post()?;

    let service = state.service.lock().await;
    let post = service.submit_new_post(request)?;
    Ok((StatusCode::CREATED, Json(post)))
}

async fn update_post_handler<R, B>(
    State(state): State<Arc<AppState<R, B>>>,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Json<Post>, PostError>
where
    R: RecordStore + 'static,
    B: BlobBackend + 'static,
{
    let form = PostForm::read(multipart).await?;

    let service = state.service.lock().await;
    let existing = service.get_post(&id)?;
    let edit = form.into_post_edit(&existing)?;
    let post = service.submit_post_edit(&existing, edit)?;
    Ok(Json(post))
}

async fn delete_post_handler<R, B>(
    State(state): State<Arc<AppState<R, B>>>,
    Path(id): Path<String>,
) -> Result<StatusCode, PostError>
where
    R: RecordStore + 'static,
    B: BlobBackend + 'static,
{
    let service = state.service.lock().await;
    let existing = service.get_post(&id)?;
    service.delete_post(&existing)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn resequence_handler<R, B>(
    State(state): State<Arc<AppState<R, B>>>,
) -> Result<Json<ResequenceResponse>, PostError>
where
    R: RecordStore + 'static,
    B: BlobBackend + 'static,
{
    let service = state.service.lock().await;
    let rewritten = service.resequence()?;
    Ok(Json(ResequenceResponse { rewritten }))
}
