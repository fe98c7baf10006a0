//! Job submission endpoint.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Extension, Json, Router,
};
use mcp_common::{McpRequest, McpResponse};

use crate::error::{ApiError, Result};
use crate::trace::TraceId;
use crate::AppState;

/// POST /mcp - Queue a job and return its id without waiting for the backend.
async fn submit(
    State(state): State<Arc<AppState>>,
    trace_id: Option<Extension<TraceId>>,
    payload: std::result::Result<Json<McpRequest>, JsonRejection>,
) -> Result<Json<McpResponse>> {
    let Json(request) = payload.map_err(|e| ApiError::InvalidRequest(e.body_text()))?;
    let trace_id = trace_id
        .map(|Extension(id)| id)
        .unwrap_or_else(TraceId::generate);

    let task_id = state.dispatcher.dispatch(request, trace_id).await?;

    Ok(Json(McpResponse::pending(task_id)))
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/mcp", post(submit))
        .with_state(state)
}
