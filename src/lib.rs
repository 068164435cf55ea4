//! # Flowgraph Core
//!
//! The core graph model behind a visual stream-topology editor.
//!
//! A topology is a bipartite directed graph: **workers** (stream
//! consumers/processors) connected to **topics** (named channels). Workers
//! read from and write to topics; an edge from a topic into a worker means
//! "consumes from", an edge from a worker into a topic means "produces
//! into". This crate provides:
//!
//! - **`graph`**: the `TopologyGraph` model with invariant-preserving
//!   mutation operations and the bipartite connection validator
//! - **`layout`**: a pure layered (Sugiyama-style) layout engine assigning
//!   node positions from graph structure alone
//! - **`codec`**: the bidirectional mapping between the graph and the flat
//!   worker-row persistence format
//! - **`editor`**: the command-message boundary a rendering frontend
//!   drives mutations through
//!
//! ## Key Design Principles
//!
//! 1. **Invariants hold after every operation** - no dangling edges, no
//!    same-kind edges, unique ids, even on error paths
//! 2. **Layout is a pure function** - no state survives between runs;
//!    identical input yields identical positions
//! 3. **Rejections are recoverable** - a refused mutation never leaves the
//!    graph partially modified
//! 4. **Rendering stays outside** - the crate exposes positions and
//!    attachment sides, never drawing
//!
//! ## Example
//!
//! ```rust
//! use flowgraph_core::editor::{Command, TopologyEditor};
//! use flowgraph_core::graph::NodeKind;
//!
//! let mut editor = TopologyEditor::new();
//! editor.apply(Command::AddNode {
//!     kind: NodeKind::Worker,
//!     label: None,
//! })?;
//! assert_eq!(editor.node_views().len(), 1);
//! # Ok::<(), flowgraph_core::Error>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod codec;
pub mod editor;
pub mod graph;
pub mod layout;

// Re-export key types
pub use graph::{NodeId, NodeKind, TopologyGraph};

/// Result type for flowgraph-core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for flowgraph-core
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Topology graph errors
    #[error("Graph error: {0}")]
    Graph(#[from] graph::GraphError),

    /// Tabular codec errors
    #[error("Codec error: {0}")]
    Codec(#[from] codec::CodecError),
}
