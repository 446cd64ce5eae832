use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use voxscribe_core::FileRecordSummary;

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::error::HttpAppError;
use crate::response::{ApiResponse, PaginationMeta};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    page: Option<usize>,
    /// Page size; `limit` is accepted as an alias.
    #[serde(alias = "limit")]
    per_page: Option<usize>,
}

#[tracing::instrument(skip(state), fields(operation = "list_files"))]
pub async fn list_files(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ApiResponse<Vec<FileRecordSummary>>>, HttpAppError> {
    let page = query.page.unwrap_or(1).max(1);
    let per_page = query
        .per_page
        .unwrap_or(DEFAULT_PAGE_SIZE)
        .clamp(1, MAX_PAGE_SIZE);

    let (records, total) = state.store.list(page, per_page).await?;
    let summaries: Vec<FileRecordSummary> = records.iter().map(Into::into).collect();

    Ok(Json(ApiResponse::ok_with_meta(
        summaries,
        PaginationMeta::new(total, page, per_page),
    )))
}
