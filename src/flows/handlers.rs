use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use log::debug;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::shared::state::AppState;
use crate::core::urls::ApiUrls;
use crate::flows::data::{empty_flow_data, FlowDataStore};
use crate::flows::error::FlowError;
use crate::flows::nodes::NodeRegistry;
use crate::flows::publish::PublishAssembler;
use crate::flows::registry::FlowRegistry;
use crate::flows::types::*;

pub fn configure_flow_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(ApiUrls::FLOWS, get(list_flows_handler).post(create_flow_handler))
        .route(ApiUrls::FLOW_DUPLICATE, post(duplicate_flow_handler))
        .route(
            ApiUrls::FLOW_BY_ID,
            put(update_flow_handler).delete(delete_flow_handler),
        )
}

pub fn configure_flow_data_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            ApiUrls::FLOW_DATA,
            get(get_flow_data_handler).post(save_flow_data_handler),
        )
        .route(ApiUrls::SAVE_CONTENT, post(save_content_handler))
        .route(ApiUrls::PUBLISH_FLOW, post(publish_flow_handler))
}

pub fn configure_node_routes() -> Router<Arc<AppState>> {
    Router::new().route(
        ApiUrls::NODES,
        get(list_nodes_handler)
            .post(create_node_handler)
            .put(update_node_handler)
            .delete(delete_node_handler),
    )
}

async fn list_flows_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Flow>>, FlowError> {
    let registry = FlowRegistry::new(state.store.clone());
    Ok(Json(registry.list().await?))
}

/// The body is optional: an empty request creates a flow with the default name.
async fn create_flow_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<CreateFlowResponse>, FlowError> {
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        CreateFlowRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| {
            debug!("Rejected create flow body: {e}");
            FlowError::InvalidBody(e)
        })?
    };
    let registry = FlowRegistry::new(state.store.clone());
    Ok(Json(registry.create(request).await?))
}

async fn duplicate_flow_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Flow>, FlowError> {
    let registry = FlowRegistry::new(state.store.clone());
    Ok(Json(registry.duplicate(id).await?))
}

async fn update_flow_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(patch): Json<FlowPatch>,
) -> Result<StatusCode, FlowError> {
    let registry = FlowRegistry::new(state.store.clone());
    registry.update(id, patch).await?;
    Ok(StatusCode::OK)
}

async fn delete_flow_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, FlowError> {
    let registry = FlowRegistry::new(state.store.clone());
    registry.delete(id).await?;
    Ok(StatusCode::OK)
}

async fn get_flow_data_handler(
    State(state): State<Arc<AppState>>,
    Path(flow_id): Path<Uuid>,
) -> Result<Response, FlowError> {
    let data = FlowDataStore::new(state.store.clone());
    Ok(match data.get(flow_id).await? {
        Some(record) => Json(record).into_response(),
        None => Json(empty_flow_data()).into_response(),
    })
}

async fn save_flow_data_handler(
    State(state): State<Arc<AppState>>,
    Path(flow_id): Path<Uuid>,
    Json(request): Json<SaveFlowDataRequest>,
) -> Result<StatusCode, FlowError> {
    let data = FlowDataStore::new(state.store.clone());
    data.save(flow_id, request).await?;
    Ok(StatusCode::OK)
}

async fn save_content_handler(
    State(state): State<Arc<AppState>>,
    Path(flow_id): Path<Uuid>,
    Json(request): Json<SaveContentRequest>,
) -> Result<StatusCode, FlowError> {
    let data = FlowDataStore::new(state.store.clone());
    data.save_node_content(flow_id, request).await?;
    Ok(StatusCode::OK)
}

async fn publish_flow_handler(
    State(state): State<Arc<AppState>>,
    Path(flow_id): Path<Uuid>,
    Json(request): Json<PublishRequest>,
) -> Result<Json<PublishedFlow>, FlowError> {
    let assembler = PublishAssembler::new(state.store.clone());
    Ok(Json(assembler.publish(flow_id, request).await?))
}

async fn list_nodes_handler(
    State(state): State<Arc<AppState>>,
    Path(flow_id): Path<Uuid>,
) -> Result<Json<Vec<FlowNode>>, FlowError> {
    let registry = NodeRegistry::new(state.store.clone());
    Ok(Json(registry.list_by_flow(flow_id).await?))
}

async fn create_node_handler(
    State(state): State<Arc<AppState>>,
    Path(flow_id): Path<Uuid>,
    Json(request): Json<CreateNodeRequest>,
) -> Result<Json<FlowNode>, FlowError> {
    let registry = NodeRegistry::new(state.store.clone());
    Ok(Json(registry.create(flow_id, request).await?))
}

async fn update_node_handler(
    State(state): State<Arc<AppState>>,
    Path(node_id): Path<String>,
    Json(patch): Json<NodePatch>,
) -> Result<StatusCode, FlowError> {
    let registry = NodeRegistry::new(state.store.clone());
    registry.update(&node_id, patch).await?;
    Ok(StatusCode::OK)
}

async fn delete_node_handler(
    State(state): State<Arc<AppState>>,
    Path(node_id): Path<String>,
) -> Result<StatusCode, FlowError> {
    let registry = NodeRegistry::new(state.store.clone());
    registry.delete(&node_id).await?;
    Ok(StatusCode::OK)
}
