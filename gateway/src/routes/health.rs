use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;

use crate::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
    /// Tracked job records per state.
    jobs: BTreeMap<&'static str, usize>,
}

async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let jobs = state
        .queue
        .store()
        .counts()
        .await
        .into_iter()
        .map(|(job_state, count)| (job_state.as_str(), count))
        .collect();

    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        jobs,
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .with_state(state)
}
