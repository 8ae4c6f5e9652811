//! Seams between the ingestion core and its collaborators

pub mod accessor;
pub mod graph;

pub use accessor::DataAccessor;
pub use graph::GraphNode;
