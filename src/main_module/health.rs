//! Liveness and health check handlers

use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use log::warn;
use std::sync::Arc;

use crate::core::shared::state::AppState;

pub async fn liveness() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "msg": "Hello From flow Server" }))
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> (StatusCode, Json<serde_json::Value>) {
    let store_ok = match state.store.ping().await {
        Ok(()) => true,
        Err(e) => {
            warn!("Health check: store unreachable: {e}");
            false
        }
    };

    let status = if store_ok { "healthy" } else { "degraded" };
    let code = if store_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        code,
        Json(serde_json::json!({
            "status": status,
            "service": "flowserver",
            "version": env!("CARGO_PKG_VERSION"),
            "store": store_ok
        })),
    )
}

pub async fn health_check_simple() -> (StatusCode, Json<serde_json::Value>) {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "status": "ok",
            "service": "flowserver",
            "version": env!("CARGO_PKG_VERSION")
        })),
    )
}
