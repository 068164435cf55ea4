//! Unit tests for the topology graph: mutation operations, connection
//! validation, cascades, neighbor queries, and the structural invariants.

use super::error::GraphError;
use super::topology::*;

/// Helper: a graph with one worker and one topic.
fn pair() -> (TopologyGraph, NodeId, NodeId) {
    let mut graph = TopologyGraph::new();
    let worker = graph.add_node(NodeKind::Worker, Some("w".to_string()));
    let topic = graph.add_node(NodeKind::Topic, Some("t".to_string()));
    (graph, worker, topic)
}

/// Helper: asserts the structural invariants the model promises after
/// every operation.
fn assert_invariants(graph: &TopologyGraph) {
    for edge in graph.edges().values() {
        let source = graph.node(&edge.source).expect("dangling edge source");
        let target = graph.node(&edge.target).expect("dangling edge target");
        assert_ne!(source.kind, target.kind, "same-kind edge {}", edge.id);
    }
}

// ---- Node creation ----

#[test]
fn test_empty_graph() {
    let graph = TopologyGraph::new();
    assert_eq!(graph.node_count(), 0);
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_add_node_allocates_kind_prefixed_ids() {
    let mut graph = TopologyGraph::new();
    let worker = graph.add_node(NodeKind::Worker, None);
    let topic = graph.add_node(NodeKind::Topic, None);

    assert_eq!(worker, NodeId::from("worker-1"));
    assert_eq!(topic, NodeId::from("topic-2"));
    assert_eq!(graph.node(&worker).unwrap().kind, NodeKind::Worker);
    assert_eq!(graph.node(&worker).unwrap().label, "Worker 1");
    assert_eq!(graph.node(&topic).unwrap().label, "Topic 2");
}

#[test]
fn test_shared_counter_never_collides_across_kinds() {
    let mut graph = TopologyGraph::new();
    let mut seen = fxhash::FxHashSet::default();
    for _ in 0..10 {
        assert!(seen.insert(graph.add_node(NodeKind::Worker, None)));
        assert!(seen.insert(graph.add_node(NodeKind::Topic, None)));
    }
    assert_eq!(graph.node_count(), 20);
}

#[test]
fn test_insert_with_id_rejects_duplicates() {
    let mut graph = TopologyGraph::new();
    graph
        .insert_node_with_id(NodeId::from("worker-7"), NodeKind::Worker, "w".to_string())
        .unwrap();
    let result =
        graph.insert_node_with_id(NodeId::from("worker-7"), NodeKind::Worker, "x".to_string());
    assert!(matches!(result, Err(GraphError::DuplicateNode(_))));
    assert_eq!(graph.node(&NodeId::from("worker-7")).unwrap().label, "w");
}

#[test]
fn test_counter_advances_past_inserted_ids() {
    let mut graph = TopologyGraph::new();
    graph
        .insert_node_with_id(NodeId::from("worker-5"), NodeKind::Worker, "w".to_string())
        .unwrap();
    let fresh = graph.add_node(NodeKind::Topic, None);
    assert_eq!(fresh, NodeId::from("topic-6"));
}

#[test]
fn test_add_node_skips_shadowed_generated_ids() {
    let mut graph = TopologyGraph::new();
    // A decoded topic can occupy a name the generator would produce.
    graph
        .insert_node_with_id(NodeId::from("topic-1"), NodeKind::Topic, "taken".to_string())
        .unwrap();
    let fresh = graph.add_node(NodeKind::Topic, None);
    assert_ne!(fresh, NodeId::from("topic-1"));
    assert!(graph.contains_node(&fresh));
}

// ---- Connection validation ----

#[test]
fn test_valid_connection_is_direction_agnostic() {
    let (graph, worker, topic) = pair();
    assert!(graph.can_connect(&worker, &topic));
    assert!(graph.can_connect(&topic, &worker));
}

#[test]
fn test_same_kind_pairs_are_invalid() {
    let mut graph = TopologyGraph::new();
    let w1 = graph.add_node(NodeKind::Worker, None);
    let w2 = graph.add_node(NodeKind::Worker, None);
    let t1 = graph.add_node(NodeKind::Topic, None);
    let t2 = graph.add_node(NodeKind::Topic, None);

    assert!(!graph.can_connect(&w1, &w2));
    assert!(!graph.can_connect(&t1, &t2));

    let result = graph.add_edge(&w1, &w2);
    assert!(matches!(result, Err(GraphError::InvalidConnection { .. })));
    let result = graph.add_edge(&t1, &t2);
    assert!(matches!(result, Err(GraphError::InvalidConnection { .. })));
    assert_eq!(graph.edge_count(), 0);
}

#[test]
fn test_worker_worker_edge_rejected_regardless_of_graph_state() {
    let mut graph = TopologyGraph::new();
    let w1 = graph.add_node(NodeKind::Worker, None);
    let w2 = graph.add_node(NodeKind::Worker, None);
    let t = graph.add_node(NodeKind::Topic, None);
    graph.add_edge(&w1, &t).unwrap();
    graph.add_edge(&t, &w2).unwrap();

    // Even with both workers wired through a topic, the direct pair stays invalid.
    let result = graph.add_edge(&w1, &w2);
    assert!(matches!(result, Err(GraphError::InvalidConnection { .. })));
    assert_eq!(graph.edge_count(), 2);
    assert_invariants(&graph);
}

#[test]
fn test_add_edge_missing_endpoint() {
    let (mut graph, worker, _) = pair();
    let result = graph.add_edge(&worker, &NodeId::from("nope"));
    assert!(matches!(result, Err(GraphError::NodeNotFound(_))));
    let result = graph.add_edge(&NodeId::from("nope"), &worker);
    assert!(matches!(result, Err(GraphError::NodeNotFound(_))));
    assert_eq!(graph.edge_count(), 0);
}

// ---- Edge identity ----

#[test]
fn test_edge_id_is_deterministic() {
    let (mut graph, worker, topic) = pair();
    let id = graph.add_edge(&worker, &topic).unwrap();
    assert_eq!(id, EdgeId::between(&worker, &topic));
    assert_eq!(id.as_str(), "e-worker-1-topic-2");
}

#[test]
fn test_re_adding_an_edge_is_idempotent() {
    let (mut graph, worker, topic) = pair();
    let first = graph.add_edge(&worker, &topic).unwrap();
    let second = graph.add_edge(&worker, &topic).unwrap();
    assert_eq!(first, second);
    assert_eq!(graph.edge_count(), 1);

    // The opposite direction is a distinct edge.
    let reverse = graph.add_edge(&topic, &worker).unwrap();
    assert_ne!(first, reverse);
    assert_eq!(graph.edge_count(), 2);
    assert_invariants(&graph);
}

// ---- Removal ----

#[test]
fn test_remove_node_cascades_to_edges() {
    let mut graph = TopologyGraph::new();
    let w1 = graph.add_node(NodeKind::Worker, None);
    let w2 = graph.add_node(NodeKind::Worker, None);
    let topic = graph.add_node(NodeKind::Topic, None);
    graph.add_edge(&w1, &topic).unwrap();
    graph.add_edge(&topic, &w2).unwrap();

    let removed = graph.remove_node(&topic).unwrap();
    assert_eq!(removed.id, topic);
    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 0);
    assert_invariants(&graph);

    // Previously adjacent nodes no longer report the removed id.
    assert!(graph.neighbors(&w1, Flow::Both).unwrap().is_empty());
    assert!(graph.neighbors(&w2, Flow::Both).unwrap().is_empty());
}

#[test]
fn test_remove_node_not_found() {
    let mut graph = TopologyGraph::new();
    let result = graph.remove_node(&NodeId::from("worker-9"));
    assert!(matches!(result, Err(GraphError::NodeNotFound(_))));
}

#[test]
fn test_remove_edge_is_exact() {
    let (mut graph, worker, topic) = pair();
    let produce = graph.add_edge(&worker, &topic).unwrap();
    let consume = graph.add_edge(&topic, &worker).unwrap();

    let removed = graph.remove_edge(&produce).unwrap();
    assert_eq!(removed.id, produce);
    assert_eq!(graph.edge_count(), 1);
    assert!(graph.edge(&consume).is_some());
    // Both nodes survive an edge removal.
    assert_eq!(graph.node_count(), 2);
    assert_invariants(&graph);
}

#[test]
fn test_remove_edge_not_found() {
    let (mut graph, worker, topic) = pair();
    let id = EdgeId::between(&worker, &topic);
    let result = graph.remove_edge(&id);
    assert!(matches!(result, Err(GraphError::EdgeNotFound(_))));
}

// ---- Rename ----

#[test]
fn test_rename_changes_label_only() {
    let (mut graph, worker, topic) = pair();
    let edge = graph.add_edge(&worker, &topic).unwrap();

    graph.rename_node(&worker, "renamed").unwrap();

    let node = graph.node(&worker).unwrap();
    assert_eq!(node.label, "renamed");
    assert_eq!(node.id, worker);
    assert_eq!(node.kind, NodeKind::Worker);
    assert!(graph.edge(&edge).is_some());
}

#[test]
fn test_rename_not_found() {
    let mut graph = TopologyGraph::new();
    let result = graph.rename_node(&NodeId::from("ghost"), "x");
    assert!(matches!(result, Err(GraphError::NodeNotFound(_))));
}

// ---- Neighbor queries ----

#[test]
fn test_neighbors_filter_by_flow() {
    let mut graph = TopologyGraph::new();
    let worker = graph.add_node(NodeKind::Worker, None);
    let input = graph.add_node(NodeKind::Topic, Some("in".to_string()));
    let output = graph.add_node(NodeKind::Topic, Some("out".to_string()));
    graph.add_edge(&input, &worker).unwrap();
    graph.add_edge(&worker, &output).unwrap();

    assert_eq!(
        graph.neighbors(&worker, Flow::Incoming).unwrap(),
        vec![input.clone()]
    );
    assert_eq!(
        graph.neighbors(&worker, Flow::Outgoing).unwrap(),
        vec![output.clone()]
    );
    assert_eq!(
        graph.neighbors(&worker, Flow::Both).unwrap(),
        vec![input.clone(), output.clone()]
    );

    // Symmetric from the topic side.
    assert_eq!(
        graph.neighbors(&input, Flow::Outgoing).unwrap(),
        vec![worker.clone()]
    );
    assert!(graph.neighbors(&input, Flow::Incoming).unwrap().is_empty());
}

#[test]
fn test_neighbors_deduplicates_bidirectional_pairs() {
    let (mut graph, worker, topic) = pair();
    graph.add_edge(&worker, &topic).unwrap();
    graph.add_edge(&topic, &worker).unwrap();

    let peers = graph.neighbors(&worker, Flow::Both).unwrap();
    assert_eq!(peers, vec![topic]);
}

#[test]
fn test_neighbors_not_found_is_an_error_not_empty() {
    let graph = TopologyGraph::new();
    let result = graph.neighbors(&NodeId::from("worker-1"), Flow::Both);
    assert!(matches!(result, Err(GraphError::NodeNotFound(_))));
}

// ---- Styles ----

#[test]
fn test_restyle_edges_touches_every_edge() {
    let (mut graph, worker, topic) = pair();
    graph.add_edge(&worker, &topic).unwrap();
    graph.add_edge(&topic, &worker).unwrap();

    graph.restyle_edges(EdgeStyle::Floating);
    assert!(graph
        .edges()
        .values()
        .all(|e| e.style == EdgeStyle::Floating));
}

#[test]
fn test_set_edge_style_not_found() {
    let (mut graph, worker, topic) = pair();
    let id = EdgeId::between(&worker, &topic);
    let result = graph.set_edge_style(&id, EdgeStyle::Floating);
    assert!(matches!(result, Err(GraphError::EdgeNotFound(_))));
}

// ---- Invariants under mixed operation sequences ----

#[test]
fn test_invariants_hold_across_a_mutation_sequence() {
    let mut graph = TopologyGraph::new();
    let mut workers = Vec::new();
    let mut topics = Vec::new();
    for _ in 0..4 {
        workers.push(graph.add_node(NodeKind::Worker, None));
        topics.push(graph.add_node(NodeKind::Topic, None));
    }
    for (i, worker) in workers.iter().enumerate() {
        graph.add_edge(&topics[i], worker).unwrap();
        graph.add_edge(worker, &topics[(i + 1) % topics.len()]).unwrap();
        assert_invariants(&graph);
    }

    graph.remove_node(&workers[1]).unwrap();
    assert_invariants(&graph);
    graph.remove_node(&topics[2]).unwrap();
    assert_invariants(&graph);
    let edge = EdgeId::between(&topics[0], &workers[0]);
    graph.remove_edge(&edge).unwrap();
    assert_invariants(&graph);
    graph.rename_node(&workers[3], "tail").unwrap();
    assert_invariants(&graph);

    // A rejected mutation leaves the counts unchanged.
    let nodes = graph.node_count();
    let edges = graph.edge_count();
    assert!(graph.add_edge(&workers[0], &workers[3]).is_err());
    assert_eq!(graph.node_count(), nodes);
    assert_eq!(graph.edge_count(), edges);
    assert_invariants(&graph);
}

#[test]
fn test_edges_in_order_follows_insertion() {
    let mut graph = TopologyGraph::new();
    let worker = graph.add_node(NodeKind::Worker, None);
    let a = graph.add_node(NodeKind::Topic, Some("a".to_string()));
    let b = graph.add_node(NodeKind::Topic, Some("b".to_string()));

    let first = graph.add_edge(&a, &worker).unwrap();
    let second = graph.add_edge(&worker, &b).unwrap();
    let third = graph.add_edge(&b, &worker).unwrap();

    let order: Vec<EdgeId> = graph.edges_in_order().map(|e| e.id.clone()).collect();
    assert_eq!(order, vec![first.clone(), second, third]);

    graph.remove_edge(&first).unwrap();
    let order: Vec<EdgeId> = graph.edges_in_order().map(|e| e.id.clone()).collect();
    assert_eq!(order.len(), 2);
}
