use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::error::HttpAppError;
use crate::handlers::parse_file_id;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDeleted {
    pub file_id: Uuid,
    pub deleted: bool,
}

/// Delete the stored audio and its metadata record. The binary is removed
/// best-effort first; a missing binary never blocks record deletion.
#[tracing::instrument(skip(state), fields(operation = "delete_file"))]
pub async fn delete_file(
    State(state): State<Arc<AppState>>,
    Path(file_id): Path<String>,
) -> Result<Json<ApiResponse<FileDeleted>>, HttpAppError> {
    let file_id = parse_file_id(&file_id)?;
    let record = state.store.get(file_id).await?;

    match tokio::fs::remove_file(&record.path).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => {
            tracing::warn!(
                file_id = %file_id,
                path = %record.path.display(),
                error = %e,
                "Failed to remove audio binary, deleting record anyway"
            );
        }
    }

    state.store.delete(file_id).await?;

    Ok(Json(ApiResponse::ok(FileDeleted {
        file_id,
        deleted: true,
    })))
}
