//! Core domain models for the pipeline graph.
//!
//! These types are the source of truth for what a workflow looks like in
//! memory, and they serialize verbatim into the snapshot format.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

// ---------------------------------------------------------------------------
// NodeStatus
// ---------------------------------------------------------------------------

/// Where a node currently sits in its `Idle -> Running -> Completed` state
/// machine. Transitions are one-directional within a run; only a full-graph
/// reset moves a node back to `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Idle,
    Running,
    Completed,
}

// ---------------------------------------------------------------------------
// NodeKind
// ---------------------------------------------------------------------------

/// The built-in node kinds plus an escape hatch for host-registered extras.
///
/// Built-ins serialize as their bare key (`"input"`, `"process"`, …); an
/// extra kind serializes as whatever string the host registered it under.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Input,
    Process,
    Transform,
    Filter,
    Custom,
    Output,
    /// A host-registered kind, keyed by its registration string.
    #[serde(untagged)]
    Extra(String),
}

impl NodeKind {
    /// The string key this kind is registered and serialized under.
    pub fn key(&self) -> &str {
        match self {
            NodeKind::Input => "input",
            NodeKind::Process => "process",
            NodeKind::Transform => "transform",
            NodeKind::Filter => "filter",
            NodeKind::Custom => "custom",
            NodeKind::Output => "output",
            NodeKind::Extra(key) => key,
        }
    }

    /// Whether nodes of this kind seed a workflow run.
    pub fn is_entry(&self) -> bool {
        matches!(self, NodeKind::Input)
    }

    /// Simulated processing time used when a node does not declare its own
    /// `duration_ms`.
    pub fn default_duration_ms(&self) -> u64 {
        match self {
            NodeKind::Input => 1500,
            NodeKind::Process => 2500,
            NodeKind::Transform => 3000,
            NodeKind::Filter => 2000,
            NodeKind::Custom => 2800,
            NodeKind::Output => 1000,
            NodeKind::Extra(_) => 2000,
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

// ---------------------------------------------------------------------------
// Ports
// ---------------------------------------------------------------------------

/// The closed set of port data types used for connection compatibility.
///
/// A port without a declared type is untyped and connects to anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PortType {
    A,
    B,
    C,
}

impl fmt::Display for PortType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PortType::A => f.write_str("A"),
            PortType::B => f.write_str("B"),
            PortType::C => f.write_str("C"),
        }
    }
}

/// A named attachment point on a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Port {
    /// Unique within its node and direction.
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Declared data type; `None` means untyped (wildcard).
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub port_type: Option<PortType>,
}

impl Port {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: None,
            port_type: None,
        }
    }
}

/// The ordered input and output port sequences of a node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodePorts {
    #[serde(default)]
    pub inputs: Vec<Port>,
    #[serde(default)]
    pub outputs: Vec<Port>,
}

// ---------------------------------------------------------------------------
// Node
// ---------------------------------------------------------------------------

/// A unit of simulated work in the pipeline graph.
///
/// By domain convention an `Input` node declares no input ports and an
/// `Output` node no output ports; neither is enforced structurally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    /// Opaque unique identifier (referenced by edges).
    pub id: String,
    pub kind: NodeKind,
    pub label: String,
    #[serde(default)]
    pub status: NodeStatus,
    /// Simulated processing time in milliseconds. Falls back to the kind
    /// default when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    #[serde(default)]
    pub ports: NodePorts,
    /// Open-ended host attributes carried through unmodified.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Node {
    /// Bare node with no ports and default status.
    pub fn new(id: impl Into<String>, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            label: label.into(),
            status: NodeStatus::default(),
            duration_ms: None,
            ports: NodePorts::default(),
            extra: Map::new(),
        }
    }

    /// The simulated duration a run will charge this node.
    pub fn effective_duration_ms(&self) -> u64 {
        self.duration_ms
            .unwrap_or_else(|| self.kind.default_duration_ms())
    }
}

// ---------------------------------------------------------------------------
// Edge
// ---------------------------------------------------------------------------

/// Directed connection from one node's output port to another's input port.
///
/// Port references are optional; an absent reference addresses the node's
/// implicit default port.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_port: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_port: Option<String>,
    /// Open-ended host attributes carried through unmodified.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Edge {
    /// Edge between two nodes' default ports.
    pub fn new(
        id: impl Into<String>,
        source: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            target: target.into(),
            source_port: None,
            target_port: None,
            extra: Map::new(),
        }
    }
}
