//! API Gateway Library
//!
//! This crate provides the HTTP REST API for user management. It validates
//! requests, calls the embedded user service, and maps outcomes to status codes.

pub mod config;
pub mod extractors;
pub mod handlers;
pub mod openapi;
pub mod routes;
pub mod shutdown;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::info;

use user_service_lib::infra::Database;
use user_service_lib::{UserManager, UserStore};

use crate::config::GatewayConfig;
use crate::routes::create_router;
use crate::shutdown::shutdown_signal;
use crate::state::AppState;

/// Run the HTTP server, overriding the configured bind address.
pub async fn run_server(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = GatewayConfig::from_env();
    config.host = host.to_string();
    config.port = port;

    run_server_with_config(config).await
}

/// Run the HTTP server with the given configuration.
async fn run_server_with_config(config: GatewayConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Initialize database
    let db = Database::connect(&config.database).await?;

    // Create repository and service
    let user_repo = Arc::new(UserStore::new(db.get_connection()));
    let user_service = Arc::new(UserManager::new(user_repo));

    let state = AppState::new(user_service, Arc::new(db));

    // Build router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("{}:{}", config.host, config.port).parse()?;
    info!("Gateway listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Gateway stopped");
    Ok(())
}
