use log::{debug, info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::flows::error::FlowError;
use crate::flows::types::*;
use crate::store::DocumentStore;

/// Per-node metadata scoped to a flow. Keeps at most one start node per flow
/// by clearing the others before a node is promoted; the two writes are not
/// atomic, so concurrent promotions may both win.
pub struct NodeRegistry {
    store: Arc<dyn DocumentStore>,
}

impl NodeRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list_by_flow(&self, flow_id: Uuid) -> Result<Vec<FlowNode>, FlowError> {
        self.store
            .find_nodes(flow_id)
            .await
            .map_err(FlowError::store("Failed to list nodes"))
    }

    /// New nodes never start as the entry point.
    pub async fn create(
        &self,
        flow_id: Uuid,
        request: CreateNodeRequest,
    ) -> Result<FlowNode, FlowError> {
        let node = FlowNode {
            flow_id,
            node_id: request.node_id,
            is_start: false,
            channel: request
                .channel
                .filter(|c| !c.is_empty())
                .unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
            label: request.label,
            position: request.position,
            kind: request.kind,
        };
        self.store
            .insert_node(&node)
            .await
            .map_err(FlowError::store("Failed to create node"))?;
        debug!("Created node {} in flow {flow_id}", node.node_id);
        Ok(node)
    }

    pub async fn update(&self, node_id: &str, patch: NodePatch) -> Result<(), FlowError> {
        let on_err = "Failed to update node";

        if patch.update.is_start == Some(true) {
            let flow_id = match patch.flow_id {
                Some(flow_id) => Some(flow_id),
                None => self
                    .store
                    .find_node(node_id)
                    .await
                    .map_err(FlowError::store(on_err))?
                    .map(|n| n.flow_id),
            };
            match flow_id {
                Some(flow_id) => {
                    let cleared = self
                        .store
                        .clear_start_nodes(flow_id)
                        .await
                        .map_err(FlowError::store(on_err))?;
                    info!("Node {node_id} becomes start of flow {flow_id} ({cleared} cleared)");
                }
                None => warn!("Cannot resolve flow of node {node_id}; start nodes left as is"),
            }
        }

        if patch.update.is_empty() {
            return Ok(());
        }
        let found = self
            .store
            .update_node(node_id, &patch.update)
            .await
            .map_err(FlowError::store(on_err))?;
        if !found {
            warn!("Update for unknown node {node_id} ignored");
        }
        Ok(())
    }

    pub async fn delete(&self, node_id: &str) -> Result<(), FlowError> {
        let found = self
            .store
            .delete_node(node_id)
            .await
            .map_err(FlowError::store("Failed to delete node"))?;
        if !found {
            debug!("Delete for unknown node {node_id} ignored");
        }
        Ok(())
    }
}
