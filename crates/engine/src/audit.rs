//! Snapshot audit — advisory structural checks, run before persisting or
//! sharing a workflow.
//!
//! Findings reported:
//! 1. Duplicate node IDs within the snapshot.
//! 2. Edges referencing missing node or port IDs (both sides).
//! 3. Nodes that can never become ready — dependency-cycle members and
//!    anything downstream of them, which a run would leave `Idle` forever.
//!
//! The runtime engine never consults the audit: cycles are tolerated at run
//! time and contained by the convergence sweep's fixed point.

use std::collections::{HashMap, HashSet, VecDeque};

use graph::WorkflowSnapshot;
use thiserror::Error;

/// A single audit finding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuditIssue {
    #[error("duplicate node ID: '{0}'")]
    DuplicateNodeId(String),

    #[error("edge '{edge_id}' references unknown node '{node_id}' ({side} side)")]
    UnknownNodeReference {
        edge_id: String,
        node_id: String,
        side: &'static str,
    },

    #[error("edge '{edge_id}' references unknown port '{port_id}' on node '{node_id}' ({side} side)")]
    UnknownPortReference {
        edge_id: String,
        node_id: String,
        port_id: String,
        side: &'static str,
    },

    #[error("node '{0}' can never become ready (dependency cycle or downstream of one)")]
    NeverReady(String),
}

/// Audit a snapshot, returning every finding. An empty vector means clean.
pub fn audit_snapshot(snapshot: &WorkflowSnapshot) -> Vec<AuditIssue> {
    let mut issues = Vec::new();

    // -----------------------------------------------------------------------
    // 1. Node IDs must be unique.
    // -----------------------------------------------------------------------
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in &snapshot.nodes {
        if !seen_ids.insert(node.id.as_str()) {
            issues.push(AuditIssue::DuplicateNodeId(node.id.clone()));
        }
    }

    let nodes_by_id: HashMap<&str, &graph::Node> = snapshot
        .nodes
        .iter()
        .map(|node| (node.id.as_str(), node))
        .collect();

    // -----------------------------------------------------------------------
    // 2. Edge endpoints must resolve.
    // -----------------------------------------------------------------------
    for edge in &snapshot.edges {
        match nodes_by_id.get(edge.source.as_str()) {
            None => issues.push(AuditIssue::UnknownNodeReference {
                edge_id: edge.id.clone(),
                node_id: edge.source.clone(),
                side: "source",
            }),
            Some(node) => {
                if let Some(port_id) = &edge.source_port {
                    if !node.ports.outputs.iter().any(|p| &p.id == port_id) {
                        issues.push(AuditIssue::UnknownPortReference {
                            edge_id: edge.id.clone(),
                            node_id: edge.source.clone(),
                            port_id: port_id.clone(),
                            side: "source",
                        });
                    }
                }
            }
        }
        match nodes_by_id.get(edge.target.as_str()) {
            None => issues.push(AuditIssue::UnknownNodeReference {
                edge_id: edge.id.clone(),
                node_id: edge.target.clone(),
                side: "target",
            }),
            Some(node) => {
                if let Some(port_id) = &edge.target_port {
                    if !node.ports.inputs.iter().any(|p| &p.id == port_id) {
                        issues.push(AuditIssue::UnknownPortReference {
                            edge_id: edge.id.clone(),
                            node_id: edge.target.clone(),
                            port_id: port_id.clone(),
                            side: "target",
                        });
                    }
                }
            }
        }
    }

    // -----------------------------------------------------------------------
    // 3. Readiness fixed point (Kahn-style in-degree peeling). Whatever the
    //    peel cannot reach is exactly what a run would leave Idle.
    // -----------------------------------------------------------------------
    let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
    let mut in_degree: HashMap<&str, usize> = HashMap::new();

    for node in &snapshot.nodes {
        adjacency.entry(node.id.as_str()).or_default();
        in_degree.entry(node.id.as_str()).or_insert(0);
    }

    for edge in &snapshot.edges {
        if !nodes_by_id.contains_key(edge.target.as_str()) {
            continue;
        }
        // A missing source still gates its target at run time (the
        // readiness check counts the dangling predecessor), so the target's
        // in-degree rises but never drains.
        if nodes_by_id.contains_key(edge.source.as_str()) {
            adjacency
                .entry(edge.source.as_str())
                .or_default()
                .push(edge.target.as_str());
        }
        *in_degree.entry(edge.target.as_str()).or_insert(0) += 1;
    }

    let mut ready: VecDeque<&str> = in_degree
        .iter()
        .filter(|(_, &degree)| degree == 0)
        .map(|(&id, _)| id)
        .collect();

    let mut peeled: HashSet<&str> = HashSet::new();
    while let Some(node_id) = ready.pop_front() {
        if !peeled.insert(node_id) {
            continue;
        }
        if let Some(successors) = adjacency.get(node_id) {
            for &successor in successors {
                let degree = in_degree.entry(successor).or_insert(0);
                *degree = degree.saturating_sub(1);
                if *degree == 0 {
                    ready.push_back(successor);
                }
            }
        }
    }

    let mut stranded: Vec<&str> = nodes_by_id
        .keys()
        .filter(|id| !peeled.contains(*id))
        .copied()
        .collect();
    stranded.sort_unstable();
    for node_id in stranded {
        issues.push(AuditIssue::NeverReady(node_id.to_owned()));
    }

    issues
}
