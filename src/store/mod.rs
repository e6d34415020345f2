//! Document store adapter for the three flow collections.
//!
//! The store only offers single-document atomic operations. Anything that
//! touches more than one document (cascading deletes, start-node switching)
//! is sequenced by the callers without a transaction.

pub mod error;
pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

pub use error::StoreError;
pub use memory::MemoryDocumentStore;
#[cfg(feature = "postgres")]
pub use postgres::{ensure_schema, PgDocumentStore};

use async_trait::async_trait;
use serde_json::Value;
use uuid::Uuid;

use crate::flows::types::{
    Flow, FlowDataRecord, FlowGraph, FlowNode, FlowPatch, NodeUpdate, PublishedFlow,
};

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Round trip to the backend, used by the health endpoint.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn insert_flow(&self, flow: &Flow) -> Result<(), StoreError>;
    async fn find_flows(&self) -> Result<Vec<Flow>, StoreError>;
    async fn find_flow(&self, id: Uuid) -> Result<Option<Flow>, StoreError>;
    /// Returns false when no flow has this id.
    async fn update_flow(&self, id: Uuid, patch: &FlowPatch) -> Result<bool, StoreError>;
    async fn delete_flow(&self, id: Uuid) -> Result<bool, StoreError>;

    async fn insert_node(&self, node: &FlowNode) -> Result<(), StoreError>;
    async fn find_nodes(&self, flow_id: Uuid) -> Result<Vec<FlowNode>, StoreError>;
    async fn find_node(&self, node_id: &str) -> Result<Option<FlowNode>, StoreError>;
    /// Patches the first node with this node id. Returns false when none matched.
    async fn update_node(&self, node_id: &str, update: &NodeUpdate) -> Result<bool, StoreError>;
    /// Sets `isStart = false` on every start node of the flow, returning how many changed.
    async fn clear_start_nodes(&self, flow_id: Uuid) -> Result<u64, StoreError>;
    /// Deletes the first node with this node id.
    async fn delete_node(&self, node_id: &str) -> Result<bool, StoreError>;
    async fn delete_nodes(&self, flow_id: Uuid) -> Result<u64, StoreError>;

    async fn find_flow_data(&self, flow_id: Uuid) -> Result<Option<FlowDataRecord>, StoreError>;
    /// Replaces the given sections and the timestamp, creating the record if absent.
    /// A `None` section keeps what is stored.
    async fn upsert_flow_data(
        &self,
        flow_id: Uuid,
        draft: Option<&FlowGraph>,
        published: Option<&PublishedFlow>,
        updated_at: &str,
    ) -> Result<(), StoreError>;
    /// Writes `flowData.nodeContents[node_id]` only, creating the record if absent.
    async fn set_node_content(
        &self,
        flow_id: Uuid,
        node_id: &str,
        content: &Value,
        updated_at: &str,
    ) -> Result<(), StoreError>;
    async fn delete_flow_data(&self, flow_id: Uuid) -> Result<u64, StoreError>;
}
