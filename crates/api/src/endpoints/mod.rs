//! API endpoints.

mod auth;
mod comments;
mod notifications;
mod posts;
mod stats;
mod taxonomy;

use axum::Router;

use crate::middleware::AppState;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(posts::router())
        .merge(comments::router())
        .merge(taxonomy::router())
        .merge(notifications::router())
        .merge(stats::router())
}
