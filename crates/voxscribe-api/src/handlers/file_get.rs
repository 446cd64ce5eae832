use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use voxscribe_core::FileRecord;

use crate::error::HttpAppError;
use crate::handlers::parse_file_id;
use crate::response::ApiResponse;
use crate::state::AppState;

#[tracing::instrument(skip(state), fields(operation = "get_file"))]
pub async fn get_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<FileRecord>>, HttpAppError> {
    let file_id = parse_file_id(&file_id)?;
    let record = state.store.get(file_id).await?;
    Ok(Json(ApiResponse::ok(record)))
}
