//! Aggregate statistics endpoint.

use axum::{extract::State, routing::get, Router};
use quill_common::AppResult;
use quill_core::services::StatsOverview;

use crate::{middleware::AppState, response::ApiResponse};

async fn overview(State(state): State<AppState>) -> AppResult<ApiResponse<StatsOverview>> {
    let stats = state.stats_service.overview().await?;
    Ok(ApiResponse::ok(stats))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/stats/", get(overview))
}
