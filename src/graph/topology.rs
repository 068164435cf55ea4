//! Topology graph data structures.
//!
//! Defines `Node`, `Edge`, and `TopologyGraph` with bipartite edge
//! validation, cascading removal, and insertion-ordered edge traversal.

use std::fmt;

use fxhash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::error::GraphError;

/// Unique identifier for a node in the topology.
///
/// Generated ids are namespaced by kind (`worker-<n>`, `topic-<n>`);
/// decoded topic ids are the topic name itself so that every row
/// referencing a topic resolves to the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for NodeId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for NodeId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Unique identifier for an edge in the topology.
///
/// Deterministically derived from the endpoint pair, so re-adding the
/// same connection resolves to the same id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(String);

impl EdgeId {
    /// Derives the id for an edge from `source` to `target`.
    #[must_use]
    pub fn between(source: &NodeId, target: &NodeId) -> Self {
        Self(format!("e-{source}-{target}"))
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Classification of a topology node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// A stream-processing unit that consumes from and/or produces to topics.
    Worker,
    /// A named channel that workers read from or write to.
    Topic,
}

impl NodeKind {
    /// Id prefix for generated node ids of this kind.
    #[must_use]
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Worker => "worker",
            Self::Topic => "topic",
        }
    }

    /// Display title used for default labels.
    #[must_use]
    pub fn title(self) -> &'static str {
        match self {
            Self::Worker => "Worker",
            Self::Topic => "Topic",
        }
    }
}

/// A 2D position, top-left anchored.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f64,
    /// Vertical coordinate.
    pub y: f64,
}

/// Which side of a node's footprint edges attach to.
///
/// Derived from the layout direction, never hand-authored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachSide {
    /// Left edge of the footprint.
    Left,
    /// Right edge of the footprint.
    Right,
    /// Top edge of the footprint.
    Top,
    /// Bottom edge of the footprint.
    Bottom,
}

/// Cosmetic edge rendering variant.
///
/// Carries no topology semantics; the editor toggles it globally.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    /// Orthogonal smooth-step routing.
    #[default]
    SmoothStep,
    /// Free-floating bezier routing.
    Floating,
}

/// Edge-direction filter for neighbor queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    /// Neighbors reached by edges pointing into the queried node.
    Incoming,
    /// Neighbors reached by edges leaving the queried node.
    Outgoing,
    /// Both directions.
    Both,
}

/// Pass-through persistence fields carried by decoded worker nodes.
///
/// Workers created fresh in the editor have no originating row and
/// export with empty fields.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WorkerMeta {
    /// Opaque metadata string from the originating row.
    pub metadata: String,
    /// Broker bootstrap address from the originating row.
    pub bootstrap_address: String,
}

/// A node in the topology: a worker or a topic.
///
/// Id and kind are immutable once created; the label is the only
/// user-editable attribute. Position and attachment sides are derived
/// by the layout engine.
#[derive(Debug, Clone)]
pub struct Node {
    /// Unique node identifier.
    pub id: NodeId,
    /// Node classification, fixed at creation.
    pub kind: NodeKind,
    /// Mutable display name, independent of the id.
    pub label: String,
    /// Top-left anchored position, written by the layout engine.
    pub position: Position,
    /// Side outgoing edges leave from.
    pub source_side: AttachSide,
    /// Side incoming edges arrive at.
    pub target_side: AttachSide,
    /// Incoming connections (fan-in). `SmallVec` avoids heap alloc for <= 4 inputs.
    pub inputs: SmallVec<[EdgeId; 4]>,
    /// Outgoing connections (fan-out). `SmallVec` avoids heap alloc for <= 4 outputs.
    pub outputs: SmallVec<[EdgeId; 4]>,
    /// Originating-row fields for decoded workers, `None` otherwise.
    pub worker_meta: Option<WorkerMeta>,
}

impl Node {
    fn new(id: NodeId, kind: NodeKind, label: String) -> Self {
        Self {
            id,
            kind,
            label,
            position: Position::default(),
            source_side: AttachSide::Right,
            target_side: AttachSide::Left,
            inputs: SmallVec::new(),
            outputs: SmallVec::new(),
            worker_meta: None,
        }
    }

    /// Numeric suffix of a generated worker id (`worker-<n>`).
    ///
    /// `None` for topics.
    #[must_use]
    pub fn worker_index(&self) -> Option<u32> {
        if self.kind != NodeKind::Worker {
            return None;
        }
        self.id.as_str().rsplit('-').next()?.parse().ok()
    }
}

/// An edge represents a produce or consume relationship.
///
/// An edge from a topic into a worker means the worker consumes from the
/// topic; from a worker into a topic, the worker produces into it.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Unique edge identifier, derived from the endpoint pair.
    pub id: EdgeId,
    /// Source node.
    pub source: NodeId,
    /// Target node.
    pub target: NodeId,
    /// Cosmetic rendering variant.
    pub style: EdgeStyle,
    /// Cosmetic animation flag.
    pub animated: bool,
}

/// Returns whether two nodes may be joined by an edge.
///
/// Valid iff exactly one endpoint is a worker and the other a topic;
/// direction does not affect validity. Pure on node descriptors so a
/// frontend can preview a drag-to-connect gesture without committing.
#[must_use]
pub fn is_valid_connection(source: &Node, target: &Node) -> bool {
    matches!(
        (source.kind, target.kind),
        (NodeKind::Worker, NodeKind::Topic) | (NodeKind::Topic, NodeKind::Worker)
    )
}

/// The complete topology graph.
///
/// Holds the node and edge sets and enforces the structural invariants:
/// bipartite edges, no dangling edges, unique ids. Edge insertion order
/// is preserved for deterministic export. Assumes exclusive single-writer
/// access; callers serialize mutations.
pub struct TopologyGraph {
    /// All nodes, keyed by `NodeId`.
    nodes: FxHashMap<NodeId, Node>,
    /// All edges, keyed by `EdgeId`.
    edges: FxHashMap<EdgeId, Edge>,
    /// Edge ids in insertion order, for deterministic traversal.
    edge_order: Vec<EdgeId>,
    /// Next value of the id counter shared across all node kinds.
    next_node_id: u64,
}

impl fmt::Debug for TopologyGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TopologyGraph")
            .field("node_count", &self.nodes.len())
            .field("edge_count", &self.edges.len())
            .field("next_node_id", &self.next_node_id)
            .finish_non_exhaustive()
    }
}

impl TopologyGraph {
    /// Creates a new empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: FxHashMap::default(),
            edges: FxHashMap::default(),
            edge_order: Vec::new(),
            next_node_id: 1,
        }
    }

    /// Adds a node with a freshly allocated id.
    ///
    /// The id counter is shared across kinds, so a worker and a topic
    /// created in sequence never collide. With no label given, a default
    /// of the form `Worker <n>` / `Topic <n>` is used. Always succeeds.
    pub fn add_node(&mut self, kind: NodeKind, label: Option<String>) -> NodeId {
        let (id, seq) = loop {
            let seq = self.next_node_id;
            self.next_node_id += 1;
            let id = NodeId::from(format!("{}-{seq}", kind.prefix()));
            // Decoded topic names are arbitrary strings and may shadow a
            // generated id; skip past them.
            if !self.nodes.contains_key(&id) {
                break (id, seq);
            }
        };
        let label = label.unwrap_or_else(|| format!("{} {seq}", kind.title()));
        self.nodes.insert(id.clone(), Node::new(id.clone(), kind, label));
        id
    }

    /// Inserts a node under a caller-chosen id (decode path).
    ///
    /// Advances the shared id counter past any numeric suffix in `id` so
    /// later `add_node` calls never collide with decoded ids.
    pub(crate) fn insert_node_with_id(
        &mut self,
        id: NodeId,
        kind: NodeKind,
        label: String,
    ) -> Result<&mut Node, GraphError> {
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        if let Some(n) = id
            .as_str()
            .rsplit('-')
            .next()
            .and_then(|s| s.parse::<u64>().ok())
        {
            self.next_node_id = self.next_node_id.max(n + 1);
        }
        let node = Node::new(id.clone(), kind, label);
        Ok(self.nodes.entry(id).or_insert(node))
    }

    /// Adds an edge between two nodes.
    ///
    /// The connection is validated before any mutation; on rejection the
    /// graph is untouched. The edge id is derived from the endpoint pair,
    /// so re-adding an existing connection is an idempotent no-op that
    /// returns the existing id.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` if either endpoint is missing.
    /// Returns `GraphError::InvalidConnection` if both endpoints have the
    /// same kind.
    pub fn add_edge(&mut self, source: &NodeId, target: &NodeId) -> Result<EdgeId, GraphError> {
        let source_node = self
            .nodes
            .get(source)
            .ok_or_else(|| GraphError::NodeNotFound(source.clone()))?;
        let target_node = self
            .nodes
            .get(target)
            .ok_or_else(|| GraphError::NodeNotFound(target.clone()))?;

        if !is_valid_connection(source_node, target_node) {
            return Err(GraphError::InvalidConnection {
                source: source.clone(),
                target: target.clone(),
            });
        }

        let id = EdgeId::between(source, target);
        if self.edges.contains_key(&id) {
            return Ok(id);
        }

        let edge = Edge {
            id: id.clone(),
            source: source.clone(),
            target: target.clone(),
            style: EdgeStyle::default(),
            animated: false,
        };
        self.edges.insert(id.clone(), edge);
        self.edge_order.push(id.clone());

        // Update node adjacency lists
        if let Some(node) = self.nodes.get_mut(source) {
            node.outputs.push(id.clone());
        }
        if let Some(node) = self.nodes.get_mut(target) {
            node.inputs.push(id.clone());
        }

        Ok(id)
    }

    /// Removes a node, cascading to every edge that references it.
    ///
    /// The cascade is atomic from the caller's point of view: no observer
    /// ever sees a dangling edge. Returns the removed node.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` if the id is absent.
    pub fn remove_node(&mut self, id: &NodeId) -> Result<Node, GraphError> {
        let node = self
            .nodes
            .remove(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;

        let doomed: FxHashSet<EdgeId> = node
            .inputs
            .iter()
            .chain(node.outputs.iter())
            .cloned()
            .collect();

        for edge_id in &doomed {
            if let Some(edge) = self.edges.remove(edge_id) {
                let peer = if edge.source == *id {
                    edge.target
                } else {
                    edge.source
                };
                if let Some(peer_node) = self.nodes.get_mut(&peer) {
                    peer_node.inputs.retain(|e| e != edge_id);
                    peer_node.outputs.retain(|e| e != edge_id);
                }
            }
        }
        self.edge_order.retain(|e| !doomed.contains(e));

        Ok(node)
    }

    /// Removes exactly one edge; no cascade.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::EdgeNotFound` if the id is absent.
    pub fn remove_edge(&mut self, id: &EdgeId) -> Result<Edge, GraphError> {
        let edge = self
            .edges
            .remove(id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.clone()))?;
        self.edge_order.retain(|e| e != id);

        if let Some(node) = self.nodes.get_mut(&edge.source) {
            node.outputs.retain(|e| e != id);
        }
        if let Some(node) = self.nodes.get_mut(&edge.target) {
            node.inputs.retain(|e| e != id);
        }

        Ok(edge)
    }

    /// Replaces a node's label. Id, kind, and edges are unaffected.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` if the id is absent.
    pub fn rename_node(&mut self, id: &NodeId, label: impl Into<String>) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;
        node.label = label.into();
        Ok(())
    }

    /// Sets the cosmetic style of one edge.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::EdgeNotFound` if the id is absent.
    pub fn set_edge_style(&mut self, id: &EdgeId, style: EdgeStyle) -> Result<(), GraphError> {
        let edge = self
            .edges
            .get_mut(id)
            .ok_or_else(|| GraphError::EdgeNotFound(id.clone()))?;
        edge.style = style;
        Ok(())
    }

    /// Rewrites the cosmetic style of every edge (editor-wide toggle).
    pub fn restyle_edges(&mut self, style: EdgeStyle) {
        for edge in self.edges.values_mut() {
            edge.style = style;
        }
    }

    // ---- Accessors ----

    /// Returns the number of nodes in the graph.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Returns the number of edges in the graph.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Returns a reference to a node by id.
    #[must_use]
    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Returns whether a node with this id exists.
    #[must_use]
    pub fn contains_node(&self, id: &NodeId) -> bool {
        self.nodes.contains_key(id)
    }

    /// Returns a reference to an edge by id.
    #[must_use]
    pub fn edge(&self, id: &EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Returns all nodes.
    #[must_use]
    pub fn nodes(&self) -> &FxHashMap<NodeId, Node> {
        &self.nodes
    }

    /// Returns all edges.
    #[must_use]
    pub fn edges(&self) -> &FxHashMap<EdgeId, Edge> {
        &self.edges
    }

    /// Iterates edges in insertion order.
    pub fn edges_in_order(&self) -> impl Iterator<Item = &Edge> {
        self.edge_order.iter().filter_map(move |id| self.edges.get(id))
    }

    /// Mutable node access for the layout write-back path.
    pub(crate) fn node_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    /// Mutable edge access for the decode path.
    pub(crate) fn edge_mut(&mut self, id: &EdgeId) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    /// Returns whether the pair would pass connection validation.
    ///
    /// Missing endpoints count as not connectable.
    #[must_use]
    pub fn can_connect(&self, source: &NodeId, target: &NodeId) -> bool {
        match (self.nodes.get(source), self.nodes.get(target)) {
            (Some(s), Some(t)) => is_valid_connection(s, t),
            _ => false,
        }
    }

    /// Returns the ids of nodes adjacent to `id`, filtered by flow
    /// direction, in edge insertion order without duplicates.
    ///
    /// For a worker these are topic ids (inputs and/or outputs); for a
    /// topic, the symmetric set of worker ids.
    ///
    /// # Errors
    ///
    /// Returns `GraphError::NodeNotFound` if the id is absent.
    pub fn neighbors(&self, id: &NodeId, flow: Flow) -> Result<Vec<NodeId>, GraphError> {
        let node = self
            .nodes
            .get(id)
            .ok_or_else(|| GraphError::NodeNotFound(id.clone()))?;

        let edge_ids: Vec<&EdgeId> = match flow {
            Flow::Incoming => node.inputs.iter().collect(),
            Flow::Outgoing => node.outputs.iter().collect(),
            Flow::Both => node.inputs.iter().chain(node.outputs.iter()).collect(),
        };

        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        for edge_id in edge_ids {
            if let Some(edge) = self.edges.get(edge_id) {
                let peer = if edge.source == *id {
                    &edge.target
                } else {
                    &edge.source
                };
                if seen.insert(peer.clone()) {
                    out.push(peer.clone());
                }
            }
        }
        Ok(out)
    }
}

impl Default for TopologyGraph {
    fn default() -> Self {
        Self::new()
    }
}
