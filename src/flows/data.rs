use log::debug;
use serde_json::{json, Value};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::shared::utils::timestamp;
use crate::flows::error::FlowError;
use crate::flows::types::*;
use crate::store::DocumentStore;

/// Shape returned for flows that have never been saved.
pub fn empty_flow_data() -> Value {
    json!({ "flowData": { "nodes": [], "edges": [] } })
}

pub struct FlowDataStore {
    store: Arc<dyn DocumentStore>,
}

impl FlowDataStore {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, flow_id: Uuid) -> Result<Option<FlowDataRecord>, FlowError> {
        self.store
            .find_flow_data(flow_id)
            .await
            .map_err(FlowError::store("Failed to load flow data"))
    }

    /// Replaces the draft and the published snapshot that were sent. A section
    /// left out of the request keeps its stored value.
    pub async fn save(&self, flow_id: Uuid, request: SaveFlowDataRequest) -> Result<(), FlowError> {
        self.store
            .upsert_flow_data(
                flow_id,
                request.flow_data.as_ref(),
                request.published_data.as_ref(),
                &timestamp(),
            )
            .await
            .map_err(FlowError::store("Failed to save flow data"))?;
        match &request.flow_data {
            Some(graph) => debug!(
                "Saved flow data for {flow_id}: {} node(s), {} edge(s)",
                graph.nodes.len(),
                graph.edges.len()
            ),
            None => debug!("Saved flow data for {flow_id} without a draft"),
        }
        Ok(())
    }

    /// Writes a single node's content, leaving the rest of the record untouched.
    pub async fn save_node_content(
        &self,
        flow_id: Uuid,
        request: SaveContentRequest,
    ) -> Result<(), FlowError> {
        self.store
            .set_node_content(flow_id, &request.node_id, &request.content, &timestamp())
            .await
            .map_err(FlowError::store("Failed to save content"))?;
        debug!("Saved content of node {} in flow {flow_id}", request.node_id);
        Ok(())
    }
}
