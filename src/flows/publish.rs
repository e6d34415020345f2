use log::info;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

use crate::core::shared::utils::timestamp;
use crate::flows::error::FlowError;
use crate::flows::types::*;
use crate::store::DocumentStore;

/// Null, false, zero and the empty string count as no content.
fn is_blank(content: &Value) -> bool {
    match content {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64() == Some(0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

/// Joins the submitted canvas with the stored node metadata.
///
/// Canvas nodes without a stored counterpart get the default channel and are
/// never the start node. The start node is taken from the stored nodes, so a
/// start node missing from the canvas is still reported.
pub fn assemble(
    flow_id: Uuid,
    nodes: &[CanvasNode],
    node_contents: &NodeContents,
    stored: &[FlowNode],
    updated_at: String,
) -> PublishedFlow {
    let by_id: HashMap<&str, &FlowNode> = stored.iter().map(|n| (n.node_id.as_str(), n)).collect();

    let published = nodes
        .iter()
        .map(|node| {
            let meta = by_id.get(node.id.as_str());
            PublishedNode {
                id: node.id.clone(),
                kind: node.kind.clone(),
                position: node.position,
                data: PublishedNodeData {
                    label: node.data.label.clone(),
                    content: node_contents
                        .get(&node.id)
                        .filter(|c| !is_blank(c))
                        .cloned()
                        .unwrap_or_else(|| Value::Array(Vec::new())),
                    channel: meta
                        .map(|m| m.channel.clone())
                        .filter(|c| !c.is_empty())
                        .unwrap_or_else(|| DEFAULT_CHANNEL.to_string()),
                    is_start: meta.is_some_and(|m| m.is_start),
                },
            }
        })
        .collect();

    PublishedFlow {
        flow_id,
        flow_name: PUBLISHED_FLOW_NAME.to_string(),
        start_node: stored.iter().find(|n| n.is_start).map(|n| n.node_id.clone()),
        nodes: published,
        updated_at,
    }
}

pub struct PublishAssembler {
    store: Arc<dyn DocumentStore>,
}

impl PublishAssembler {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Builds the snapshot and stores it together with the submitted draft in one write.
    pub async fn publish(
        &self,
        flow_id: Uuid,
        request: PublishRequest,
    ) -> Result<PublishedFlow, FlowError> {
        let on_err = "Failed to publish flow";
        let stored = self
            .store
            .find_nodes(flow_id)
            .await
            .map_err(FlowError::store(on_err))?;

        let now = timestamp();
        let published = assemble(
            flow_id,
            &request.nodes,
            &request.node_contents,
            &stored,
            now.clone(),
        );

        let draft = FlowGraph {
            nodes: request.nodes,
            edges: request.edges,
            node_contents: request.node_contents,
        };
        self.store
            .upsert_flow_data(flow_id, Some(&draft), Some(&published), &now)
            .await
            .map_err(FlowError::store(on_err))?;

        info!(
            "Published flow {flow_id}: {} node(s), start {:?}",
            published.nodes.len(),
            published.start_node
        );
        Ok(published)
    }
}
