use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;
use uuid::Uuid;

pub const DEFAULT_CHANNEL: &str = "omnichannel";
pub const DEFAULT_FLOW_NAME: &str = "New Flow";
pub const DUPLICATE_PREFIX: &str = "Copy of ";
pub const PUBLISHED_FLOW_NAME: &str = "User Flow";
pub const SEED_NODE_LABEL: &str = "Message #1";
pub const SEED_NODE_POSITION: Position = Position { x: 400.0, y: 100.0 };

/// Rich content attached to canvas nodes, keyed by node id.
pub type NodeContents = HashMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flow {
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    pub name: String,
    pub status: bool,
    pub inbox: bool,
    pub modified: String,
}

/// Field patch for a flow. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inbox: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified: Option<String>,
}

impl FlowPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.status.is_none() && self.inbox.is_none() && self.modified.is_none()
    }

    pub fn apply(&self, flow: &mut Flow) {
        if let Some(name) = &self.name {
            flow.name = name.clone();
        }
        if let Some(status) = self.status {
            flow.status = status;
        }
        if let Some(inbox) = self.inbox {
            flow.inbox = inbox;
        }
        if let Some(modified) = &self.modified {
            flow.modified = modified.clone();
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Canvas node type as understood by the flow editor.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Custom,
    Input,
    Output,
    Group,
    #[serde(rename = "default")]
    Basic,
    #[serde(untagged)]
    Other(String),
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Custom => write!(f, "custom"),
            Self::Input => write!(f, "input"),
            Self::Output => write!(f, "output"),
            Self::Group => write!(f, "group"),
            Self::Basic => write!(f, "default"),
            Self::Other(kind) => write!(f, "{kind}"),
        }
    }
}

/// Authoritative per-node metadata, independent of the canvas rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowNode {
    pub flow_id: Uuid,
    pub node_id: String,
    pub is_start: bool,
    pub channel: String,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub position: Position,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
}

/// Node fields a client may change after creation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_start: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl NodeUpdate {
    pub fn is_empty(&self) -> bool {
        self.channel.is_none() && self.is_start.is_none() && self.label.is_none()
    }

    pub fn apply(&self, node: &mut FlowNode) {
        if let Some(channel) = &self.channel {
            node.channel = channel.clone();
        }
        if let Some(is_start) = self.is_start {
            node.is_start = is_start;
        }
        if let Some(label) = &self.label {
            node.label = label.clone();
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanvasNodeData {
    #[serde(default)]
    pub label: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A node as drawn by the editor. Unknown editor fields are kept verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
    #[serde(default)]
    pub position: Position,
    #[serde(default)]
    pub data: CanvasNodeData,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasEdge {
    #[serde(default)]
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The editable draft of a flow.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowGraph {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
    #[serde(default)]
    pub node_contents: NodeContents,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedNodeData {
    pub label: String,
    pub content: Value,
    pub channel: String,
    pub is_start: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    pub position: Position,
    pub data: PublishedNodeData,
}

/// Frozen snapshot served to the runtime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishedFlow {
    pub flow_id: Uuid,
    pub flow_name: String,
    pub start_node: Option<String>,
    pub nodes: Vec<PublishedNode>,
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowDataRecord {
    pub flow_id: Uuid,
    #[serde(default)]
    pub flow_data: FlowGraph,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_data: Option<PublishedFlow>,
    pub updated_at: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateFlowRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateFlowResponse {
    pub flow: Flow,
    pub flow_id: Uuid,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeRequest {
    pub node_id: String,
    #[serde(default)]
    pub channel: Option<String>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub position: Position,
    #[serde(rename = "type", default)]
    pub kind: NodeKind,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodePatch {
    #[serde(flatten)]
    pub update: NodeUpdate,
    #[serde(default)]
    pub flow_id: Option<Uuid>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveFlowDataRequest {
    #[serde(default)]
    pub flow_data: Option<FlowGraph>,
    #[serde(default)]
    pub published_data: Option<PublishedFlow>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveContentRequest {
    pub node_id: String,
    #[serde(default)]
    pub content: Value,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishRequest {
    #[serde(default)]
    pub nodes: Vec<CanvasNode>,
    #[serde(default)]
    pub edges: Vec<CanvasEdge>,
    #[serde(default)]
    pub node_contents: NodeContents,
}
