//! API middleware.

#![allow(missing_docs)]

use axum::{body::Body, extract::State, http::Request, middleware::Next, response::Response};
use quill_core::services::{
    AccountService, CommentService, LikeService, NotificationService, PostService, StatsService,
    TaxonomyService, TokenService,
};
use quill_db::repositories::UserRepository;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub account_service: AccountService,
    pub post_service: PostService,
    pub comment_service: CommentService,
    pub like_service: LikeService,
    pub notification_service: NotificationService,
    pub taxonomy_service: TaxonomyService,
    pub stats_service: StatsService,
    pub token_service: TokenService,
    pub user_repo: UserRepository,
}

/// Authentication middleware.
///
/// Resolves a bearer token to a user and stashes the model in request
/// extensions. Requests without a valid token pass through anonymous;
/// handlers that need a user reject via the `AuthUser` extractor.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(auth_header) = req.headers().get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
        && let Ok(user_id) = state.token_service.verify_access(token)
        && let Ok(Some(user)) = state.user_repo.find_by_id(&user_id).await
        && user.is_active
    {
        req.extensions_mut().insert(user);
    }

    next.run(req).await
}
