//! Job polling endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use mcp_common::{JobStatus, ResultResponse};

use crate::AppState;

/// GET /result/{task_id} - Current status of a job, with its result or error once finished.
async fn get_result(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<String>,
) -> (StatusCode, Json<ResultResponse>) {
    let status = state.queue.status(&task_id).await;
    let code = match status {
        JobStatus::NotSubmitted => StatusCode::NOT_FOUND,
        _ => StatusCode::OK,
    };

    (code, Json(ResultResponse::new(task_id, &status)))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/result/:task_id", get(get_result))
        .with_state(state)
}
