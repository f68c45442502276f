//! Comment endpoints.

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::{delete, get, patch},
    Json, Router,
};
use quill_common::AppResult;
use quill_core::services::{CommentNode, CreateCommentInput};
use quill_db::entities::comment;
use serde::Deserialize;

use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{no_content, ApiResponse, Created},
};

/// All comments on a post, as a tree.
async fn list(
    State(state): State<AppState>,
    Path(post_id): Path<String>,
) -> AppResult<ApiResponse<Vec<CommentNode>>> {
    let comments = state.comment_service.list_for_post(&post_id).await?;
    Ok(ApiResponse::ok(comments))
}

/// Comment on a post, or reply to an existing comment via `parent_id`.
async fn create(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<String>,
    Json(input): Json<CreateCommentInput>,
) -> AppResult<Created<comment::Model>> {
    let created = state
        .comment_service
        .create(&user.id, &user.username, &post_id, input)
        .await?;
    Ok(Created(created))
}

/// Comment edit request.
#[derive(Debug, Deserialize)]
pub struct EditCommentRequest {
    pub content: String,
}

/// Edit a comment. Author only.
async fn edit(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
    Json(req): Json<EditCommentRequest>,
) -> AppResult<ApiResponse<comment::Model>> {
    let updated = state
        .comment_service
        .update(&user.id, &comment_id, req.content)
        .await?;
    Ok(ApiResponse::ok(updated))
}

/// Delete a comment. Author only; replies cascade.
async fn remove(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(comment_id): Path<String>,
) -> AppResult<impl IntoResponse> {
    state.comment_service.delete(&user.id, &comment_id).await?;
    Ok(no_content())
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/posts/{post_id}/comments/", get(list).post(create))
        .route("/comments/{id}/edit/", patch(edit))
        .route("/comments/{id}/delete/", delete(remove))
}
