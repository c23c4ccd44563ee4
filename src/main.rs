// Main entry point - Dependency injection and server setup
use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use mesh_companion::application::location_service::LocationService;
use mesh_companion::application::node_directory::NodeDirectory;
use mesh_companion::application::traceroute_service::TracerouteService;
use mesh_companion::domain::node::NodeInfo;
use mesh_companion::infrastructure::clock::MonotonicClock;
use mesh_companion::infrastructure::config::{load_nodes_config, load_service_config};
use mesh_companion::infrastructure::memory_directory::InMemoryNodeDirectory;
use mesh_companion::infrastructure::position_sinks::LoggingRadioSink;
use mesh_companion::presentation::app_state::AppState;
use mesh_companion::presentation::handlers::{
    filter_positions, health_check, list_nodes, traceroute_export, traceroute_map,
    traceroute_report, transmit_positions,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let service_config = load_service_config().context("loading config/service")?;
    let nodes_config = load_nodes_config().context("loading config/nodes")?;
    let policy = service_config
        .location
        .to_policy()
        .context("invalid [location] policy")?;

    // Node directory (infrastructure layer)
    let hunter_id = nodes_config.hunter_id();
    let directory = Arc::new(InMemoryNodeDirectory::new(
        nodes_config.nodes.into_iter().map(NodeInfo::from),
    ));
    tracing::info!("Loaded {} known nodes", directory.list_nodes().len());

    // Services (application layer)
    let state = Arc::new(AppState {
        traceroute_service: TracerouteService::new(directory),
        location_service: LocationService::new(policy, Arc::new(MonotonicClock::new())),
        radio_sink: Arc::new(LoggingRadioSink::new()),
        hunter_id,
    });

    // Responses are compressed per handler, so no CompressionLayer here
    let router = Router::new()
        .route("/healthz", get(health_check))
        .route("/nodes", get(list_nodes))
        .route("/traceroute/report", post(traceroute_report))
        .route("/traceroute/map", post(traceroute_map))
        .route("/traceroute/export", post(traceroute_export))
        .route("/positions/filter", post(filter_positions))
        .route("/positions/transmit", post(transmit_positions))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr: SocketAddr = service_config
        .service
        .bind_address
        .parse()
        .with_context(|| format!("invalid bind address {}", service_config.service.bind_address))?;
    tracing::info!("Starting mesh-companion service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
