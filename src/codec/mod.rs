//! # Tabular Codec
//!
//! Bidirectional mapping between the topology graph and the flat
//! worker-row persistence format: one row per worker, with comma-joined
//! input/output topic lists. Topic nodes are implicit in the format and
//! materialize on first sight during decode.
//!
//! Decode is partial-success: a malformed row (duplicate worker id) is
//! skipped and reported by index while well-formed rows still load.
//! Encode reproduces rows from the possibly-edited graph; round-trips
//! hold up to topic-list ordering.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::graph::{NodeId, NodeKind, TopologyGraph, WorkerMeta};

/// One row of the flat persistence format.
///
/// The serde aliases accept the legacy field names still produced by
/// older backends (`consumer_name`, `metadatas`, `kafka_bootstrap_server`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkerRow {
    /// Numeric worker id, unique across rows.
    pub id: u32,
    /// Worker display name.
    #[serde(alias = "consumer_name")]
    pub worker_name: String,
    /// Comma-joined names of topics this worker consumes from; may be empty.
    #[serde(default)]
    pub topics_input: String,
    /// Comma-joined names of topics this worker produces into; may be empty.
    #[serde(default)]
    pub topics_output: String,
    /// Opaque metadata, passed through unchanged.
    #[serde(default, alias = "metadatas")]
    pub metadata: String,
    /// Broker bootstrap address, passed through unchanged.
    #[serde(default, alias = "kafka_bootstrap_server")]
    pub bootstrap_address: String,
}

/// Errors raised by the tabular codec.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CodecError {
    /// A decode input row was unusable and was skipped.
    #[error("malformed row {index}: {reason}")]
    MalformedRow {
        /// Zero-based index of the offending row in the decode input.
        index: usize,
        /// Description of what made the row unusable.
        reason: String,
    },
}

/// Result of decoding a row set: the graph built from the well-formed
/// rows, plus one failure per rejected row.
#[derive(Debug)]
pub struct Decoded {
    /// Graph assembled from the rows that decoded cleanly.
    pub graph: TopologyGraph,
    /// Per-row failures, in input order.
    pub failures: Vec<CodecError>,
}

/// Decodes a row set into a topology graph.
///
/// Each row yields one worker node (id `worker-<row.id>`, label from the
/// row's name) plus one edge per input topic (topic -> worker) and per
/// output topic (worker -> topic). A topic node is created the first time
/// its name is seen; the topic name is its id, so every row referencing
/// it resolves to the same node. Empty names in a topic list are skipped.
/// Decoded edges carry the animated flag, matching the seed path of the
/// editor frontend.
#[must_use]
pub fn decode(rows: &[WorkerRow]) -> Decoded {
    let mut graph = TopologyGraph::new();
    let mut failures = Vec::new();

    for (index, row) in rows.iter().enumerate() {
        let worker_id = NodeId::from(format!("worker-{}", row.id));
        let worker = match graph.insert_node_with_id(
            worker_id.clone(),
            NodeKind::Worker,
            row.worker_name.clone(),
        ) {
            Ok(node) => node,
            Err(_) => {
                warn!(index, id = row.id, "skipping row with duplicate worker id");
                failures.push(CodecError::MalformedRow {
                    index,
                    reason: format!("duplicate worker id {}", row.id),
                });
                continue;
            }
        };
        worker.worker_meta = Some(WorkerMeta {
            metadata: row.metadata.clone(),
            bootstrap_address: row.bootstrap_address.clone(),
        });

        for topic in split_topics(&row.topics_input) {
            let topic_id = ensure_topic(&mut graph, topic);
            seed_edge(&mut graph, &topic_id, &worker_id);
        }
        for topic in split_topics(&row.topics_output) {
            let topic_id = ensure_topic(&mut graph, topic);
            seed_edge(&mut graph, &worker_id, &topic_id);
        }
    }

    Decoded { graph, failures }
}

/// Encodes the graph back to rows, one per worker, in ascending worker id
/// order.
///
/// Topic lists are the labels of connected topics in edge insertion
/// order; empty labels are dropped so they can neither duplicate nor
/// displace a legitimate entry. Names reflect any edits; `metadata` and
/// `bootstrap_address` pass through from the originating row, or default
/// to empty for workers created fresh in the editor.
#[must_use]
pub fn encode(graph: &TopologyGraph) -> Vec<WorkerRow> {
    let mut workers: Vec<(u32, &NodeId)> = graph
        .nodes()
        .values()
        .filter_map(|node| node.worker_index().map(|index| (index, &node.id)))
        .collect();
    workers.sort();

    workers
        .into_iter()
        .map(|(id, worker_id)| {
            let mut inputs = Vec::new();
            let mut outputs = Vec::new();
            for edge in graph.edges_in_order() {
                if edge.target == *worker_id {
                    inputs.push(&edge.source);
                } else if edge.source == *worker_id {
                    outputs.push(&edge.target);
                }
            }

            let node = graph.node(worker_id);
            let meta = node
                .and_then(|n| n.worker_meta.clone())
                .unwrap_or_default();
            WorkerRow {
                id,
                worker_name: node.map(|n| n.label.clone()).unwrap_or_default(),
                topics_input: join_labels(graph, &inputs),
                topics_output: join_labels(graph, &outputs),
                metadata: meta.metadata,
                bootstrap_address: meta.bootstrap_address,
            }
        })
        .collect()
}

/// Splits a comma-joined topic list, dropping empty names.
fn split_topics(list: &str) -> impl Iterator<Item = &str> {
    list.split(',').filter(|name| !name.is_empty())
}

/// Comma-joins the labels of the given topic nodes, dropping empty labels.
fn join_labels(graph: &TopologyGraph, ids: &[&NodeId]) -> String {
    ids.iter()
        .filter_map(|id| graph.node(id))
        .map(|node| node.label.as_str())
        .filter(|label| !label.is_empty())
        .collect::<Vec<_>>()
        .join(",")
}

/// Gets or creates the topic node for a name.
fn ensure_topic(graph: &mut TopologyGraph, name: &str) -> NodeId {
    let id = NodeId::from(name);
    if !graph.contains_node(&id) {
        // Fresh graph, known-unique id: insertion cannot fail.
        let _ = graph.insert_node_with_id(id.clone(), NodeKind::Topic, name.to_string());
    }
    id
}

/// Adds a seed edge and marks it animated.
fn seed_edge(graph: &mut TopologyGraph, source: &NodeId, target: &NodeId) {
    // Both endpoints exist and differ in kind by construction.
    if let Ok(edge_id) = graph.add_edge(source, target) {
        if let Some(edge) = graph.edge_mut(&edge_id) {
            edge.animated = true;
        }
    }
}
