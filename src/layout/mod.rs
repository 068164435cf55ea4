//! # Layered Layout Engine
//!
//! Pure Sugiyama-style layout: assigns every node a position from graph
//! structure alone, arranging workers and topics in ranks that follow
//! edge direction.
//!
//! Phases:
//!
//! 1. **Back-edge reversal** - the model permits cycles, so a DFS finds
//!    back edges and reverses them in a layout-only view of the graph
//! 2. **Rank assignment** - longest path from the sources, over a
//!    deterministic topological order
//! 3. **Ordering** - barycenter passes reduce edge crossings within ranks
//! 4. **Coordinates** - fixed node footprint, fixed rank and node
//!    separation, ranks centered against the widest rank, then translated
//!    from center-anchored to top-left-anchored
//!
//! The engine owns no state between calls: `compute` is a pure function
//! of `(nodes, edges, direction)` and repeated runs on an unchanged graph
//! yield identical positions. Callers re-run it after structural change,
//! never per render.

use std::collections::VecDeque;

use fxhash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{AttachSide, NodeId, Position, TopologyGraph};

/// Fixed node footprint width used for spacing.
pub const NODE_WIDTH: f64 = 172.0;
/// Fixed node footprint height used for spacing.
pub const NODE_HEIGHT: f64 = 36.0;
/// Separation between consecutive ranks along the flow axis.
pub const RANK_SEPARATION: f64 = 50.0;
/// Separation between nodes within a rank.
pub const NODE_SEPARATION: f64 = 50.0;

/// Number of forward/backward barycenter sweeps.
const ORDERING_PASSES: usize = 4;

/// Flow axis of the layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayoutDirection {
    /// Ranks grow along the x axis.
    #[default]
    LeftToRight,
    /// Ranks grow along the y axis.
    TopToBottom,
}

impl LayoutDirection {
    /// Attachment sides `(source, target)` implied by this direction.
    #[must_use]
    pub fn attach_sides(self) -> (AttachSide, AttachSide) {
        match self {
            Self::LeftToRight => (AttachSide::Right, AttachSide::Left),
            Self::TopToBottom => (AttachSide::Bottom, AttachSide::Top),
        }
    }
}

/// A computed layout: one top-left anchored position per node.
#[derive(Debug, Clone, PartialEq)]
pub struct Layout {
    direction: LayoutDirection,
    positions: FxHashMap<NodeId, Position>,
}

impl Layout {
    /// The direction this layout was computed for.
    #[must_use]
    pub fn direction(&self) -> LayoutDirection {
        self.direction
    }

    /// Position of one node, if it was part of the layouted graph.
    #[must_use]
    pub fn position(&self, id: &NodeId) -> Option<Position> {
        self.positions.get(id).copied()
    }

    /// All computed positions.
    #[must_use]
    pub fn positions(&self) -> &FxHashMap<NodeId, Position> {
        &self.positions
    }

    /// Writes positions and attachment sides back onto the graph's nodes.
    ///
    /// Topology is never altered; nodes added to the graph after this
    /// layout was computed keep their previous position.
    pub fn apply(&self, graph: &mut TopologyGraph) {
        let (source_side, target_side) = self.direction.attach_sides();
        for (id, position) in &self.positions {
            if let Some(node) = graph.node_mut(id) {
                node.position = *position;
                node.source_side = source_side;
                node.target_side = target_side;
            }
        }
    }
}

/// Computes a layered layout for the graph's current node and edge sets.
///
/// Deterministic: node order is fixed by sorting ids, edge order is the
/// graph's insertion order, and all tie-breaking is stable.
#[must_use]
pub fn compute(graph: &TopologyGraph, direction: LayoutDirection) -> Layout {
    let mut ids: Vec<NodeId> = graph.nodes().keys().cloned().collect();
    ids.sort();

    if ids.is_empty() {
        return Layout {
            direction,
            positions: FxHashMap::default(),
        };
    }

    let edges: Vec<(NodeId, NodeId)> = graph
        .edges_in_order()
        .map(|e| (e.source.clone(), e.target.clone()))
        .collect();

    let dag_edges = reverse_back_edges(&ids, &edges);
    let ranks = assign_ranks(&ids, &dag_edges);
    let ordering = order_within_ranks(&ids, &dag_edges, &ranks);
    let positions = assign_coordinates(&ordering, direction);

    debug!(
        nodes = ids.len(),
        edges = edges.len(),
        ranks = ordering.len(),
        ?direction,
        "layout computed"
    );

    Layout {
        direction,
        positions,
    }
}

/// Finds back edges via DFS and returns the edge list with them reversed.
///
/// Reversing the back edges of a DFS forest yields an acyclic view; the
/// graph itself is untouched.
fn reverse_back_edges(ids: &[NodeId], edges: &[(NodeId, NodeId)]) -> Vec<(NodeId, NodeId)> {
    let mut successors: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    for (source, target) in edges {
        successors
            .entry(source.clone())
            .or_default()
            .push(target.clone());
    }

    let mut visited: FxHashSet<NodeId> = FxHashSet::default();
    let mut on_stack: FxHashSet<NodeId> = FxHashSet::default();
    let mut back: FxHashSet<(NodeId, NodeId)> = FxHashSet::default();

    fn dfs(
        node: &NodeId,
        successors: &FxHashMap<NodeId, Vec<NodeId>>,
        visited: &mut FxHashSet<NodeId>,
        on_stack: &mut FxHashSet<NodeId>,
        back: &mut FxHashSet<(NodeId, NodeId)>,
    ) {
        visited.insert(node.clone());
        on_stack.insert(node.clone());
        for next in successors.get(node).into_iter().flatten() {
            if on_stack.contains(next) {
                back.insert((node.clone(), next.clone()));
            } else if !visited.contains(next) {
                dfs(next, successors, visited, on_stack, back);
            }
        }
        on_stack.remove(node);
    }

    for id in ids {
        if !visited.contains(id) {
            dfs(id, &successors, &mut visited, &mut on_stack, &mut back);
        }
    }

    edges
        .iter()
        .map(|(source, target)| {
            if back.contains(&(source.clone(), target.clone())) {
                (target.clone(), source.clone())
            } else {
                (source.clone(), target.clone())
            }
        })
        .collect()
}

/// Longest-path rank assignment over a deterministic topological order.
///
/// Sources sit at rank 0; every edge points to a strictly greater rank.
fn assign_ranks(ids: &[NodeId], edges: &[(NodeId, NodeId)]) -> FxHashMap<NodeId, usize> {
    let mut in_degree: FxHashMap<NodeId, usize> = ids.iter().map(|id| (id.clone(), 0)).collect();
    let mut successors: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    for (source, target) in edges {
        *in_degree.entry(target.clone()).or_insert(0) += 1;
        successors
            .entry(source.clone())
            .or_default()
            .push(target.clone());
    }

    // Kahn's algorithm; `ids` is sorted, so the initial queue and each
    // ready batch are processed in id order.
    let mut queue: VecDeque<NodeId> = ids
        .iter()
        .filter(|id| in_degree[*id] == 0)
        .cloned()
        .collect();
    let mut topo_order: Vec<NodeId> = Vec::with_capacity(ids.len());

    while let Some(node) = queue.pop_front() {
        topo_order.push(node.clone());
        let mut ready: Vec<NodeId> = Vec::new();
        for next in successors.get(&node).into_iter().flatten() {
            if let Some(degree) = in_degree.get_mut(next) {
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    ready.push(next.clone());
                }
            }
        }
        ready.sort();
        queue.extend(ready);
    }

    let mut ranks: FxHashMap<NodeId, usize> = ids.iter().map(|id| (id.clone(), 0)).collect();
    for node in &topo_order {
        let rank = ranks[node];
        for next in successors.get(node).into_iter().flatten() {
            if let Some(next_rank) = ranks.get_mut(next) {
                if *next_rank < rank + 1 {
                    *next_rank = rank + 1;
                }
            }
        }
    }
    ranks
}

/// Groups nodes by rank and runs barycenter sweeps to reduce crossings.
///
/// Each sweep orders a rank by the average position of its neighbors in
/// the adjacent rank; sorts are stable so ties keep id order.
#[allow(clippy::cast_precision_loss)]
fn order_within_ranks(
    ids: &[NodeId],
    edges: &[(NodeId, NodeId)],
    ranks: &FxHashMap<NodeId, usize>,
) -> Vec<Vec<NodeId>> {
    let max_rank = ranks.values().max().copied().unwrap_or(0);
    let mut layers: Vec<Vec<NodeId>> = vec![Vec::new(); max_rank + 1];
    for id in ids {
        layers[ranks[id]].push(id.clone());
    }

    let mut predecessors: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    let mut successors: FxHashMap<NodeId, Vec<NodeId>> = FxHashMap::default();
    for (source, target) in edges {
        successors
            .entry(source.clone())
            .or_default()
            .push(target.clone());
        predecessors
            .entry(target.clone())
            .or_default()
            .push(source.clone());
    }

    let barycenter = |id: &NodeId,
                      neighbors: &FxHashMap<NodeId, Vec<NodeId>>,
                      index: &FxHashMap<NodeId, f64>| {
        let positions: Vec<f64> = neighbors
            .get(id)
            .into_iter()
            .flatten()
            .filter_map(|n| index.get(n).copied())
            .collect();
        if positions.is_empty() {
            0.0
        } else {
            positions.iter().sum::<f64>() / positions.len() as f64
        }
    };

    let index_of = |layer: &[NodeId]| -> FxHashMap<NodeId, f64> {
        layer
            .iter()
            .enumerate()
            .map(|(i, id)| (id.clone(), i as f64))
            .collect()
    };

    for _ in 0..ORDERING_PASSES {
        // Forward: order each rank by predecessor positions.
        for rank in 1..layers.len() {
            let index = index_of(&layers[rank - 1]);
            let mut scored: Vec<(NodeId, f64)> = layers[rank]
                .iter()
                .map(|id| (id.clone(), barycenter(id, &predecessors, &index)))
                .collect();
            scored.sort_by(|a, b| a.1.total_cmp(&b.1));
            layers[rank] = scored.into_iter().map(|(id, _)| id).collect();
        }
        // Backward: order each rank by successor positions.
        for rank in (0..layers.len().saturating_sub(1)).rev() {
            let index = index_of(&layers[rank + 1]);
            let mut scored: Vec<(NodeId, f64)> = layers[rank]
                .iter()
                .map(|id| (id.clone(), barycenter(id, &successors, &index)))
                .collect();
            scored.sort_by(|a, b| a.1.total_cmp(&b.1));
            layers[rank] = scored.into_iter().map(|(id, _)| id).collect();
        }
    }

    layers
}

/// Places each rank along the flow axis and its nodes along the cross
/// axis, centering every rank against the widest one, then translates
/// the center-anchored result to top-left anchors.
#[allow(clippy::cast_precision_loss)]
fn assign_coordinates(
    ordering: &[Vec<NodeId>],
    direction: LayoutDirection,
) -> FxHashMap<NodeId, Position> {
    let (main_extent, cross_extent) = match direction {
        LayoutDirection::LeftToRight => (NODE_WIDTH, NODE_HEIGHT),
        LayoutDirection::TopToBottom => (NODE_HEIGHT, NODE_WIDTH),
    };

    let span = |count: usize| -> f64 {
        if count == 0 {
            0.0
        } else {
            count as f64 * cross_extent + (count - 1) as f64 * NODE_SEPARATION
        }
    };
    let max_span = ordering.iter().map(|layer| span(layer.len())).fold(0.0, f64::max);

    let mut positions = FxHashMap::default();
    for (rank, layer) in ordering.iter().enumerate() {
        let main_center = rank as f64 * (main_extent + RANK_SEPARATION) + main_extent / 2.0;
        let offset = (max_span - span(layer.len())) / 2.0;
        for (slot, id) in layer.iter().enumerate() {
            let cross_center =
                offset + slot as f64 * (cross_extent + NODE_SEPARATION) + cross_extent / 2.0;
            let (x_center, y_center) = match direction {
                LayoutDirection::LeftToRight => (main_center, cross_center),
                LayoutDirection::TopToBottom => (cross_center, main_center),
            };
            positions.insert(
                id.clone(),
                Position {
                    x: x_center - NODE_WIDTH / 2.0,
                    y: y_center - NODE_HEIGHT / 2.0,
                },
            );
        }
    }
    positions
}
