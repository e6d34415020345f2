// Flow builder API modules
pub mod types;
pub mod error;
pub mod registry;
pub mod nodes;
pub mod data;
pub mod publish;
pub mod handlers;

pub use types::*;
pub use error::FlowError;
pub use registry::FlowRegistry;
pub use nodes::NodeRegistry;
pub use data::{empty_flow_data, FlowDataStore};
pub use publish::{assemble, PublishAssembler};
pub use handlers::{configure_flow_data_routes, configure_flow_routes, configure_node_routes};
