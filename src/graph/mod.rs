//! # Topology Graph Model
//!
//! Bipartite directed graph of workers and topics with
//! invariant-preserving mutation operations.
//!
//! ## Overview
//!
//! This module provides the topology layer of the editor core:
//!
//! - **`TopologyGraph`**: node and edge sets with mutation operations
//! - **`Node`** / **`Edge`**: adjacency list representation
//! - **`is_valid_connection`**: the bipartite connection predicate
//!
//! ## Key Design Principles
//!
//! 1. **Bipartite edges only** - every edge joins exactly one worker and
//!    one topic; same-kind pairs are rejected before any mutation
//! 2. **No dangling edges** - removing a node cascades to its edges
//!    atomically
//! 3. **Stable identity** - id and kind are immutable; only labels change
//! 4. **Cycles are legal** - workers and topics may form feedback loops;
//!    acyclicity is a layout concern, not a model concern

pub mod error;
pub mod topology;

#[cfg(test)]
mod tests;

// Re-export key types
pub use error::GraphError;
pub use topology::{
    is_valid_connection, AttachSide, Edge, EdgeId, EdgeStyle, Flow, Node, NodeId, NodeKind,
    Position, TopologyGraph, WorkerMeta,
};
