use log::{info, warn};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::shared::utils::{timestamp, today};
use crate::flows::error::FlowError;
use crate::flows::types::*;
use crate::store::DocumentStore;

/// Flow metadata records and the seeding/cascading around them.
pub struct FlowRegistry {
    store: Arc<dyn DocumentStore>,
}

impl FlowRegistry {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<Flow>, FlowError> {
        self.store
            .find_flows()
            .await
            .map_err(FlowError::store("Failed to list flows"))
    }

    /// Creates the flow plus its seed start node and draft. The three writes are
    /// sequential; a failure part way leaves the earlier records in place.
    pub async fn create(&self, request: CreateFlowRequest) -> Result<CreateFlowResponse, FlowError> {
        let flow = Flow {
            id: Uuid::new_v4(),
            name: request
                .name
                .filter(|n| !n.is_empty())
                .unwrap_or_else(|| DEFAULT_FLOW_NAME.to_string()),
            status: true,
            inbox: true,
            modified: today(),
        };
        self.store
            .insert_flow(&flow)
            .await
            .map_err(FlowError::store("Failed to create flow"))?;

        let start_node = FlowNode {
            flow_id: flow.id,
            node_id: Uuid::new_v4().to_string(),
            is_start: true,
            channel: DEFAULT_CHANNEL.to_string(),
            label: SEED_NODE_LABEL.to_string(),
            position: SEED_NODE_POSITION,
            kind: NodeKind::Custom,
        };
        self.store
            .insert_node(&start_node)
            .await
            .map_err(FlowError::store("Failed to create flow"))?;

        let draft = FlowGraph {
            nodes: vec![CanvasNode {
                id: start_node.node_id.clone(),
                kind: NodeKind::Custom,
                position: SEED_NODE_POSITION,
                data: CanvasNodeData {
                    label: SEED_NODE_LABEL.to_string(),
                    ..Default::default()
                },
                extra: Default::default(),
            }],
            edges: Vec::new(),
            node_contents: NodeContents::new(),
        };
        self.store
            .upsert_flow_data(flow.id, Some(&draft), None, &timestamp())
            .await
            .map_err(FlowError::store("Failed to create flow"))?;

        info!("Created flow {} ({})", flow.id, flow.name);
        Ok(CreateFlowResponse {
            flow_id: flow.id,
            flow,
        })
    }

    /// Copies the flow metadata only. Nodes and canvas data stay with the original.
    pub async fn duplicate(&self, id: Uuid) -> Result<Flow, FlowError> {
        let original = self
            .store
            .find_flow(id)
            .await
            .map_err(FlowError::store("Failed to duplicate flow"))?
            .ok_or(FlowError::NotFound("Flow"))?;

        let copy = Flow {
            id: Uuid::new_v4(),
            name: format!("{DUPLICATE_PREFIX}{}", original.name),
            modified: today(),
            ..original
        };
        self.store
            .insert_flow(&copy)
            .await
            .map_err(FlowError::store("Failed to duplicate flow"))?;

        info!("Duplicated flow {id} as {}", copy.id);
        Ok(copy)
    }

    /// Applies the patch; an unknown id is not an error.
    pub async fn update(&self, id: Uuid, patch: FlowPatch) -> Result<(), FlowError> {
        if patch.is_empty() {
            return Ok(());
        }
        let found = self
            .store
            .update_flow(id, &patch)
            .await
            .map_err(FlowError::store("Failed to update flow"))?;
        if !found {
            warn!("Update for unknown flow {id} ignored");
        }
        Ok(())
    }

    /// Deletes the flow and cascades to its canvas data and nodes.
    pub async fn delete(&self, id: Uuid) -> Result<(), FlowError> {
        let on_err = "Failed to delete flow";
        self.store
            .delete_flow(id)
            .await
            .map_err(FlowError::store(on_err))?;
        let data = self
            .store
            .delete_flow_data(id)
            .await
            .map_err(FlowError::store(on_err))?;
        let nodes = self
            .store
            .delete_nodes(id)
            .await
            .map_err(FlowError::store(on_err))?;
        info!("Deleted flow {id} ({data} data record(s), {nodes} node(s))");
        Ok(())
    }
}
