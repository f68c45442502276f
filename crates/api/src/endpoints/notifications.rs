//! Notification inbox and preference endpoints.

use axum::{
    extract::{Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use quill_common::AppResult;
use quill_core::services::UpdatePreferencesInput;
use quill_db::entities::{notification, notification_preference};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Inbox listing query.
#[derive(Debug, Default, Deserialize)]
pub struct InboxQuery {
    pub limit: Option<u64>,
    pub until_id: Option<String>,
    #[serde(default)]
    pub unread_only: bool,
}

/// Inbox page plus the unread counter.
#[derive(Debug, Serialize)]
pub struct InboxResponse {
    pub notifications: Vec<notification::Model>,
    pub unread_count: u64,
}

/// List the current user's notifications, newest first.
async fn list(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Query(query): Query<InboxQuery>,
) -> AppResult<ApiResponse<InboxResponse>> {
    let notifications = state
        .notification_service
        .list(
            &user.id,
            query.limit,
            query.until_id.as_deref(),
            query.unread_only,
        )
        .await?;
    let unread_count = state.notification_service.count_unread(&user.id).await?;
    Ok(ApiResponse::ok(InboxResponse {
        notifications,
        unread_count,
    }))
}

/// Mark a single notification as read.
async fn mark_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Path(notification_id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    state
        .notification_service
        .mark_read(&user.id, &notification_id)
        .await?;
    Ok(ApiResponse::ok(()))
}

/// Bulk mark-read response.
#[derive(Debug, Serialize)]
pub struct MarkAllResponse {
    pub updated: u64,
}

/// Mark the whole inbox as read.
async fn mark_all_read(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MarkAllResponse>> {
    let updated = state.notification_service.mark_all_read(&user.id).await?;
    Ok(ApiResponse::ok(MarkAllResponse { updated }))
}

/// Get the current user's notification preferences.
async fn preferences(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<notification_preference::Model>> {
    let prefs = state.notification_service.get_preferences(&user.id).await?;
    Ok(ApiResponse::ok(prefs))
}

/// Update the current user's notification preferences.
async fn update_preferences(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    Json(input): Json<UpdatePreferencesInput>,
) -> AppResult<ApiResponse<notification_preference::Model>> {
    let prefs = state
        .notification_service
        .update_preferences(&user.id, input)
        .await?;
    Ok(ApiResponse::ok(prefs))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/notifications/", get(list))
        .route("/notifications/read-all/", post(mark_all_read))
        .route("/notifications/{id}/read/", post(mark_read))
        .route(
            "/notifications/preferences/",
            get(preferences).patch(update_preferences),
        )
}
