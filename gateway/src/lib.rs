pub mod adapters;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod logging;
pub mod queue;
pub mod registry;
pub mod routes;
pub mod test_util;
pub mod trace;

pub use adapters::{BackendAdapter, BackendClient, RouteSchemas};
pub use config::Config;
pub use dispatcher::{AdapterTable, DispatchError, Dispatcher};
pub use queue::JobQueue;
pub use registry::BackendRegistry;
pub use trace::TraceId;

use std::sync::Arc;

use axum::{middleware, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub dispatcher: Dispatcher,
    pub queue: Arc<JobQueue>,
    /// Route schemas backing the Zeo++ adapter's whitelist.
    pub zeopp_routes: Arc<RouteSchemas>,
}

impl AppState {
    /// Wire registry, adapters, queue and dispatcher from configuration and
    /// start the worker pool. Must be called inside a tokio runtime.
    pub fn start(config: Config, zeopp_routes: RouteSchemas) -> Result<Arc<Self>, reqwest::Error> {
        let registry = Arc::new(BackendRegistry::from_config(&config.backends));
        let client = Arc::new(BackendClient::new(registry, &config.adapters)?);
        let zeopp_routes = Arc::new(zeopp_routes);

        let table = AdapterTable::standard(client, zeopp_routes.clone());
        tracing::info!("Registered adapters: {}", table.models().join(", "));
        let queue = JobQueue::start(&config.queue);
        let dispatcher = Dispatcher::new(table, queue.clone());

        Ok(Arc::new(Self {
            config,
            dispatcher,
            queue,
            zeopp_routes,
        }))
    }
}

/// Build the HTTP application.
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes::health::router(state.clone()))
        .merge(routes::mcp::router(state.clone()))
        .merge(routes::result::router(state.clone()))
        .merge(routes::zeopp::router(state))
        .layer(middleware::from_fn(logging::request_logger))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}
