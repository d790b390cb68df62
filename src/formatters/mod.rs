pub mod graph_model;
pub mod html;
pub mod json;

pub use graph_model::{
    EdgeType, GraphEdge, GraphMetadata, GraphModel, GraphNode, GraphProjector, NodeMetrics,
    NodeType,
};
pub use html::HtmlFormatter;
pub use json::JsonFormatter;
