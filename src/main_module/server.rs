//! HTTP server initialization and routing

use axum::extract::DefaultBodyLimit;
use axum::{routing::get, Router};
use log::info;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;
use crate::flows::{configure_flow_data_routes, configure_flow_routes, configure_node_routes};
use crate::security::create_cors_layer;

use super::{health_check, health_check_simple, liveness, shutdown_signal};

/// Full application router with middleware, ready to serve.
pub fn build_router(app_state: Arc<AppState>) -> Router {
    let server_config = &app_state.config.server;
    let cors = create_cors_layer(&server_config.cors_allowed_origins);
    let body_limit = server_config.body_limit_bytes;

    Router::new()
        .route(ApiUrls::LIVENESS, get(liveness))
        .route(ApiUrls::HEALTH_SIMPLE, get(health_check_simple))
        .route(ApiUrls::HEALTH, get(health_check))
        .merge(configure_flow_routes())
        .merge(configure_flow_data_routes())
        .merge(configure_node_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

pub async fn run_axum_server(app_state: Arc<AppState>) -> std::io::Result<()> {
    let server_config = app_state.config.server.clone();
    let addr: SocketAddr = format!("{}:{}", server_config.host, server_config.port)
        .parse()
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, format!("{e}")))?;

    let app = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Server running at http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
