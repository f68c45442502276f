//! Post endpoints: listing, detail, CRUD, and likes.

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{delete, get, patch, post},
    Json, Router,
};
use quill_common::AppResult;
use quill_core::services::{CreatePostInput, PostDetail, UpdatePostInput};
use quill_db::entities::{like, post::Model as Post};
use quill_db::repositories::PostFilter;
use serde::Deserialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{no_content, ApiResponse, Created},
};

/// Listing filter query. Values are category and tag slugs.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub category: Option<String>,
    pub tag: Option<String>,
}

impl From<ListQuery> for PostFilter {
    fn from(q: ListQuery) -> Self {
        Self {
            category_slug: q.category.filter(|s| !s.is_empty()),
            tag_slug: q.tag.filter(|s| !s.is_empty()),
        }
    }
}

/// List posts, newest first, optionally filtered by category or tag slug.
async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> AppResult<ApiResponse<Vec<Post>>> {
    let posts = state.post_service.list(&query.into()).await?;
    Ok(ApiResponse::ok(posts))
}

/// Fetch a single post and record the view.
async fn detail(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<ApiResponse<PostDetail>> {
    let detail = state.post_service.get(&post_id).await?;
    state.post_service.record_view(&post_id).await?;
    Ok(ApiResponse::ok(detail))
}

/// Create a post.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreatePostInput>,
) -> AppResult<Created<PostDetail>> {
    let detail = state.post_service.create(&user.id, input).await?;
    Ok(Created(detail))
}

/// Edit a post. Author only.
async fn edit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(input): Json<UpdatePostInput>,
) -> AppResult<ApiResponse<PostDetail>> {
    let detail = state.post_service.update(&user.id, &post_id, input).await?;
    Ok(ApiResponse::ok(detail))
}

/// Delete a post. Author only.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.post_service.delete(&user.id, &post_id).await?;
    Ok(no_content())
}

/// Like a post.
async fn like(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<Created<like::Model>> {
    let created = state
        .like_service
        .like(&user.id, &user.username, &post_id)
        .await?;
    Ok(Created(created))
}

/// Remove a like from a post.
async fn unlike(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.like_service.unlike(&user.id, &post_id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/", get(list))
        .route("/posts/create/", post(create))
        .route("/posts/{id}/", get(detail))
        .route("/posts/{id}/edit/", patch(edit))
        .route("/posts/{id}/delete/", delete(remove))
        .route("/posts/{id}/like/", post(like).delete(unlike))
}
