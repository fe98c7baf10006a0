use std::sync::Arc;

use axum::{extract::State, routing::get, Json, Router};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Serialize, Deserialize)]
pub struct RoutesResponse {
    pub model: String,
    pub supported_routes: Vec<String>,
}

/// GET /zeopp/list_routes - Analysis routes accepted by the Zeo++ adapter.
async fn list_routes(State(state): State<Arc<AppState>>) -> Json<RoutesResponse> {
    Json(RoutesResponse {
        model: "zeopp".to_string(),
        supported_routes: state.zeopp_routes.route_names(),
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/zeopp/list_routes", get(list_routes))
        .with_state(state)
}
