#[derive(Debug)]
pub struct ApiUrls;

impl ApiUrls {
    // Flows
    pub const FLOWS: &'static str = "/api/flows";
    pub const FLOW_BY_ID: &'static str = "/api/flows/{id}";
    pub const FLOW_DUPLICATE: &'static str = "/api/flows/duplicate/{id}";

    // Canvas data and content
    pub const FLOW_DATA: &'static str = "/api/flow-data/{flow_id}";
    pub const SAVE_CONTENT: &'static str = "/api/save-content/{flow_id}";
    pub const PUBLISH_FLOW: &'static str = "/api/publish-flow/{flow_id}";

    // Nodes: the segment is a flow id for GET/POST and a node id for PUT/DELETE
    pub const NODES: &'static str = "/api/nodes/{id}";

    // Health
    pub const LIVENESS: &'static str = "/test";
    pub const HEALTH_SIMPLE: &'static str = "/health";
    pub const HEALTH: &'static str = "/api/health";
}
