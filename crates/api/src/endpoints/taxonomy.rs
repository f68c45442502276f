//! Category and tag listings.

use axum::{extract::State, routing::get, Router};
use quill_common::AppResult;
use quill_db::entities::{category, tag};

use crate::{middleware::AppState, response::ApiResponse};

async fn categories(
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<category::Model>>> {
    let categories = state.taxonomy_service.list_categories().await?;
    Ok(ApiResponse::ok(categories))
}

async fn tags(State(state): State<AppState>) -> AppResult<ApiResponse<Vec<tag::Model>>> {
    let tags = state.taxonomy_service.list_tags().await?;
    Ok(ApiResponse::ok(tags))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/categories/", get(categories))
        .route("/tags/", get(tags))
}
