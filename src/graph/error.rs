//! Error types for topology graph operations.

use super::topology::{EdgeId, NodeId};

/// Errors that can occur during graph mutation and queries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    /// An operation referenced a node id absent from the graph.
    NodeNotFound(NodeId),

    /// An operation referenced an edge id absent from the graph.
    EdgeNotFound(EdgeId),

    /// An edge add was rejected: edges must join one worker and one topic.
    InvalidConnection {
        /// Source node id of the rejected pair.
        source: NodeId,
        /// Target node id of the rejected pair.
        target: NodeId,
    },

    /// A node with the same id already exists.
    DuplicateNode(NodeId),
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GraphError::NodeNotFound(id) => write!(f, "node not found: {id}"),
            GraphError::EdgeNotFound(id) => write!(f, "edge not found: {id}"),
            GraphError::InvalidConnection { source, target } => write!(
                f,
                "invalid connection: {source} -> {target} (an edge must join a worker and a topic)"
            ),
            GraphError::DuplicateNode(id) => write!(f, "duplicate node id: {id}"),
        }
    }
}

impl std::error::Error for GraphError {}
