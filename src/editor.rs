//! # Mutation Coordinator Boundary
//!
//! Explicit command messages a rendering frontend dispatches against the
//! topology, applied by a `TopologyEditor` that owns the graph, keeps the
//! layout consistent after structural change, and exposes the render
//! views. Behavior lives here, never embedded inside node data.
//!
//! Re-layout runs after every structural mutation and direction change;
//! renames and style toggles leave positions untouched, so callers can
//! skip re-rendering node geometry for those.

use serde::Serialize;
use tracing::{debug, info};

use crate::codec::{self, CodecError, WorkerRow};
use crate::graph::{
    AttachSide, EdgeId, EdgeStyle, NodeId, NodeKind, Position, TopologyGraph,
};
use crate::layout::{self, LayoutDirection};
use crate::Result;

/// A mutation request against the topology.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a node of the given kind; the label defaults from the
    /// allocated id when absent.
    AddNode {
        /// Kind of node to create.
        kind: NodeKind,
        /// Initial display name, or `None` for the default.
        label: Option<String>,
    },
    /// Remove a node and every edge referencing it.
    RemoveNode {
        /// Node to remove.
        id: NodeId,
    },
    /// Replace a node's display name.
    RenameNode {
        /// Node to rename.
        id: NodeId,
        /// New display name.
        label: String,
    },
    /// Connect two nodes, subject to connection validation.
    AddEdge {
        /// Source node id.
        source: NodeId,
        /// Target node id.
        target: NodeId,
    },
    /// Remove exactly one edge.
    RemoveEdge {
        /// Edge to remove.
        id: EdgeId,
    },
    /// Recompute positions, optionally switching the flow axis.
    Relayout {
        /// Direction to lay the graph out in.
        direction: LayoutDirection,
    },
    /// Switch the cosmetic style of all edges, present and future.
    SetEdgeStyle {
        /// Style to apply.
        style: EdgeStyle,
    },
}

/// What a successfully applied command did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandOutcome {
    /// A node was created under this id.
    NodeAdded(NodeId),
    /// The node and its edges were removed.
    NodeRemoved(NodeId),
    /// The node's label was replaced.
    NodeRenamed(NodeId),
    /// An edge exists under this id (newly created or already present).
    EdgeAdded(EdgeId),
    /// The edge was removed.
    EdgeRemoved(EdgeId),
    /// Positions were recomputed.
    LayoutRefreshed,
    /// Every edge now carries the new style.
    EdgesRestyled,
}

/// Per-node render data exposed at the rendering boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NodeView {
    /// Node id.
    pub id: NodeId,
    /// Node kind.
    pub kind: NodeKind,
    /// Current display name.
    pub label: String,
    /// Top-left anchored position.
    pub position: Position,
    /// Side outgoing edges leave from.
    pub source_side: AttachSide,
    /// Side incoming edges arrive at.
    pub target_side: AttachSide,
}

/// Per-edge render data exposed at the rendering boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeView {
    /// Edge id.
    pub id: EdgeId,
    /// Source node id.
    pub source: NodeId,
    /// Target node id.
    pub target: NodeId,
    /// Cosmetic rendering variant.
    pub style: EdgeStyle,
    /// Cosmetic animation flag.
    pub animated: bool,
}

/// Owns the topology on behalf of a rendering frontend.
///
/// All mutations flow through `apply`; the editor serializes them by
/// construction (single owner, `&mut self`) and re-layouts whenever the
/// topology changed.
#[derive(Debug)]
pub struct TopologyEditor {
    graph: TopologyGraph,
    direction: LayoutDirection,
    edge_style: EdgeStyle,
}

impl TopologyEditor {
    /// Creates an editor over an empty topology.
    #[must_use]
    pub fn new() -> Self {
        Self {
            graph: TopologyGraph::new(),
            direction: LayoutDirection::default(),
            edge_style: EdgeStyle::default(),
        }
    }

    /// Creates an editor seeded from persisted rows.
    ///
    /// Malformed rows are skipped; the returned failures tell the caller
    /// which ones, in input order. The seeded graph is laid out before
    /// the editor is handed back.
    #[must_use]
    pub fn seed(rows: &[WorkerRow]) -> (Self, Vec<CodecError>) {
        let decoded = codec::decode(rows);
        let mut editor = Self {
            graph: decoded.graph,
            direction: LayoutDirection::default(),
            edge_style: EdgeStyle::default(),
        };
        editor.relayout();
        info!(
            nodes = editor.graph.node_count(),
            edges = editor.graph.edge_count(),
            rejected = decoded.failures.len(),
            "editor seeded from rows"
        );
        (editor, decoded.failures)
    }

    /// Applies one command.
    ///
    /// Structural commands re-layout before returning; a rejected command
    /// leaves graph and positions exactly as they were.
    ///
    /// # Errors
    ///
    /// Returns the graph's `NotFound`/`InvalidConnection` rejections
    /// unchanged for the frontend to surface.
    pub fn apply(&mut self, command: Command) -> Result<CommandOutcome> {
        let outcome = match command {
            Command::AddNode { kind, label } => {
                let id = self.graph.add_node(kind, label);
                debug!(%id, ?kind, "node added");
                CommandOutcome::NodeAdded(id)
            }
            Command::RemoveNode { id } => {
                self.graph.remove_node(&id)?;
                debug!(%id, "node removed");
                CommandOutcome::NodeRemoved(id)
            }
            Command::RenameNode { id, label } => {
                self.graph.rename_node(&id, label)?;
                // Label edits never move nodes; skip the re-layout.
                return Ok(CommandOutcome::NodeRenamed(id));
            }
            Command::AddEdge { source, target } => {
                let id = self.graph.add_edge(&source, &target)?;
                self.graph.set_edge_style(&id, self.edge_style)?;
                debug!(%id, "edge added");
                CommandOutcome::EdgeAdded(id)
            }
            Command::RemoveEdge { id } => {
                self.graph.remove_edge(&id)?;
                debug!(%id, "edge removed");
                CommandOutcome::EdgeRemoved(id)
            }
            Command::Relayout { direction } => {
                self.direction = direction;
                CommandOutcome::LayoutRefreshed
            }
            Command::SetEdgeStyle { style } => {
                self.edge_style = style;
                self.graph.restyle_edges(style);
                return Ok(CommandOutcome::EdgesRestyled);
            }
        };

        self.relayout();
        Ok(outcome)
    }

    /// Exports the current topology as persistence rows.
    #[must_use]
    pub fn export(&self) -> Vec<WorkerRow> {
        codec::encode(&self.graph)
    }

    /// Render data for every node, in id order.
    #[must_use]
    pub fn node_views(&self) -> Vec<NodeView> {
        let mut views: Vec<NodeView> = self
            .graph
            .nodes()
            .values()
            .map(|node| NodeView {
                id: node.id.clone(),
                kind: node.kind,
                label: node.label.clone(),
                position: node.position,
                source_side: node.source_side,
                target_side: node.target_side,
            })
            .collect();
        views.sort_by(|a, b| a.id.cmp(&b.id));
        views
    }

    /// Render data for every edge, in insertion order.
    #[must_use]
    pub fn edge_views(&self) -> Vec<EdgeView> {
        self.graph
            .edges_in_order()
            .map(|edge| EdgeView {
                id: edge.id.clone(),
                source: edge.source.clone(),
                target: edge.target.clone(),
                style: edge.style,
                animated: edge.animated,
            })
            .collect()
    }

    /// Read access to the underlying graph.
    #[must_use]
    pub fn graph(&self) -> &TopologyGraph {
        &self.graph
    }

    /// The current layout direction.
    #[must_use]
    pub fn direction(&self) -> LayoutDirection {
        self.direction
    }

    /// The cosmetic style applied to edges.
    #[must_use]
    pub fn edge_style(&self) -> EdgeStyle {
        self.edge_style
    }

    fn relayout(&mut self) {
        layout::compute(&self.graph, self.direction).apply(&mut self.graph);
    }
}

impl Default for TopologyEditor {
    fn default() -> Self {
        Self::new()
    }
}
