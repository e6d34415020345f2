use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::flows::types::{
    Flow, FlowDataRecord, FlowGraph, FlowNode, FlowPatch, NodeUpdate, PublishedFlow,
};
use crate::store::{DocumentStore, StoreError};

#[derive(Debug, Default)]
struct Collections {
    flows: Vec<Flow>,
    nodes: Vec<FlowNode>,
    flow_data: HashMap<Uuid, FlowDataRecord>,
}

/// Process-local store. Documents live for the lifetime of the handle.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    inner: RwLock<Collections>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn node_count(&self) -> usize {
        self.inner.read().await.nodes.len()
    }

    pub async fn flow_data_count(&self) -> usize {
        self.inner.read().await.flow_data.len()
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }

    async fn insert_flow(&self, flow: &Flow) -> Result<(), StoreError> {
        self.inner.write().await.flows.push(flow.clone());
        Ok(())
    }

    async fn find_flows(&self) -> Result<Vec<Flow>, StoreError> {
        Ok(self.inner.read().await.flows.clone())
    }

    async fn find_flow(&self, id: Uuid) -> Result<Option<Flow>, StoreError> {
        Ok(self.inner.read().await.flows.iter().find(|f| f.id == id).cloned())
    }

    async fn update_flow(&self, id: Uuid, patch: &FlowPatch) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.flows.iter_mut().find(|f| f.id == id) {
            Some(flow) => {
                patch.apply(flow);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_flow(&self, id: Uuid) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.flows.len();
        inner.flows.retain(|f| f.id != id);
        Ok(inner.flows.len() != before)
    }

    async fn insert_node(&self, node: &FlowNode) -> Result<(), StoreError> {
        self.inner.write().await.nodes.push(node.clone());
        Ok(())
    }

    async fn find_nodes(&self, flow_id: Uuid) -> Result<Vec<FlowNode>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .nodes
            .iter()
            .filter(|n| n.flow_id == flow_id)
            .cloned()
            .collect())
    }

    async fn find_node(&self, node_id: &str) -> Result<Option<FlowNode>, StoreError> {
        Ok(self
            .inner
            .read()
            .await
            .nodes
            .iter()
            .find(|n| n.node_id == node_id)
            .cloned())
    }

    async fn update_node(&self, node_id: &str, update: &NodeUpdate) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.nodes.iter_mut().find(|n| n.node_id == node_id) {
            Some(node) => {
                update.apply(node);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn clear_start_nodes(&self, flow_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let mut changed = 0;
        for node in inner
            .nodes
            .iter_mut()
            .filter(|n| n.flow_id == flow_id && n.is_start)
        {
            node.is_start = false;
            changed += 1;
        }
        Ok(changed)
    }

    async fn delete_node(&self, node_id: &str) -> Result<bool, StoreError> {
        let mut inner = self.inner.write().await;
        match inner.nodes.iter().position(|n| n.node_id == node_id) {
            Some(idx) => {
                inner.nodes.remove(idx);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_nodes(&self, flow_id: Uuid) -> Result<u64, StoreError> {
        let mut inner = self.inner.write().await;
        let before = inner.nodes.len();
        inner.nodes.retain(|n| n.flow_id != flow_id);
        Ok((before - inner.nodes.len()) as u64)
    }

    async fn find_flow_data(&self, flow_id: Uuid) -> Result<Option<FlowDataRecord>, StoreError> {
        Ok(self.inner.read().await.flow_data.get(&flow_id).cloned())
    }

    async fn upsert_flow_data(
        &self,
        flow_id: Uuid,
        draft: Option<&FlowGraph>,
        published: Option<&PublishedFlow>,
        updated_at: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner.flow_data.entry(flow_id).or_insert_with(|| FlowDataRecord {
            flow_id,
            flow_data: FlowGraph::default(),
            published_data: None,
            updated_at: updated_at.to_string(),
        });
        if let Some(draft) = draft {
            record.flow_data = draft.clone();
        }
        if let Some(published) = published {
            record.published_data = Some(published.clone());
        }
        record.updated_at = updated_at.to_string();
        Ok(())
    }

    async fn set_node_content(
        &self,
        flow_id: Uuid,
        node_id: &str,
        content: &Value,
        updated_at: &str,
    ) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let record = inner
            .flow_data
            .entry(flow_id)
            .or_insert_with(|| FlowDataRecord {
                flow_id,
                flow_data: FlowGraph::default(),
                published_data: None,
                updated_at: updated_at.to_string(),
            });
        record
            .flow_data
            .node_contents
            .insert(node_id.to_string(), content.clone());
        record.updated_at = updated_at.to_string();
        Ok(())
    }

    async fn delete_flow_data(&self, flow_id: Uuid) -> Result<u64, StoreError> {
        Ok(u64::from(
            self.inner.write().await.flow_data.remove(&flow_id).is_some(),
        ))
    }
}
