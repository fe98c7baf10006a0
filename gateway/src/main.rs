use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mcp_gateway::{build_app, AppState, Config, RouteSchemas};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::load()?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting MCP Adapter Gateway");

    let zeopp_routes = RouteSchemas::load(&config.zeopp.routes_file, &config.zeopp.default_route)?;
    tracing::info!(
        "Loaded {} Zeo++ routes from {}",
        zeopp_routes.route_names().len(),
        config.zeopp.routes_file.display()
    );

    for (model, url) in config.backends.entries() {
        tracing::info!("Backend {} -> {}", model, url);
    }

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = AppState::start(config, zeopp_routes)?;
    let app = build_app(state);

    tracing::info!("Listening on {}", addr);
    let listener = TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
