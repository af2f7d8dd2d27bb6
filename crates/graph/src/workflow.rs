//! The `Workflow` graph container and the queries the engine depends on.
//!
//! Nodes live in a map keyed by ID (insertion order is irrelevant); edges
//! keep their insertion order, which is the order successor queries observe.
//! Adjacency is recomputed from the edge sequence on every call rather than
//! cached, so callers always see the current graph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::model::{Edge, Node, NodeStatus};

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A wholesale copy of the node and edge collections.
///
/// This is the import/export format: the in-memory model serialized verbatim.
/// Import is trusted input and bypasses connection validation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkflowSnapshot {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

// ---------------------------------------------------------------------------
// Workflow
// ---------------------------------------------------------------------------

/// The pipeline graph: a node map plus an insertion-ordered edge sequence.
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    nodes: HashMap<String, Node>,
    edges: Vec<Edge>,
}

impl Workflow {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph from a snapshot. A duplicate node ID keeps the later
    /// entry; the audit reports duplicates before they get this far.
    pub fn from_snapshot(snapshot: WorkflowSnapshot) -> Self {
        let mut workflow = Self::new();
        for node in snapshot.nodes {
            workflow.insert_node(node);
        }
        for edge in snapshot.edges {
            workflow.push_edge(edge);
        }
        workflow
    }

    /// Immutable copy of the full graph, nodes sorted by ID for stable
    /// output.
    pub fn snapshot(&self) -> WorkflowSnapshot {
        let mut nodes: Vec<Node> = self.nodes.values().cloned().collect();
        nodes.sort_by(|a, b| a.id.cmp(&b.id));
        WorkflowSnapshot {
            nodes,
            edges: self.edges.clone(),
        }
    }

    // -----------------------------------------------------------------------
    // Nodes
    // -----------------------------------------------------------------------

    /// Insert or replace a node, returning the previous entry if any.
    pub fn insert_node(&mut self, node: Node) -> Option<Node> {
        self.nodes.insert(node.id.clone(), node)
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        self.nodes.get_mut(id)
    }

    pub fn contains_node(&self, id: &str) -> bool {
        self.nodes.contains_key(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// All node IDs, sorted. The engine scans in this order so runs are
    /// reproducible despite the map-backed store.
    pub fn node_ids_sorted(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.nodes.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn node_status(&self, id: &str) -> Option<NodeStatus> {
        self.nodes.get(id).map(|node| node.status)
    }

    // -----------------------------------------------------------------------
    // Edges
    // -----------------------------------------------------------------------

    /// Append an edge as-is. Callers are expected to consult the connection
    /// validator first; snapshot import skips it by design.
    pub fn push_edge(&mut self, edge: Edge) {
        self.edges.push(edge);
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    /// Node IDs reachable over a single outgoing edge, in edge-insertion
    /// order.
    pub fn successors_of(&self, id: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|edge| edge.source == id)
            .map(|edge| edge.target.clone())
            .collect()
    }

    /// Node IDs reachable over a single incoming edge, in edge-insertion
    /// order.
    pub fn predecessors_of(&self, id: &str) -> Vec<String> {
        self.edges
            .iter()
            .filter(|edge| edge.target == id)
            .map(|edge| edge.source.clone())
            .collect()
    }
}
