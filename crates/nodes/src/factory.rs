//! Node and edge construction helpers.
//!
//! Factories own the construction details the engine does not care about:
//! ID generation, default labels, and the port layout each kind's registry
//! descriptor prescribes.

use graph::{Edge, Node, NodeKind, Port, PortType};
use tracing::warn;
use uuid::Uuid;

use crate::registry::KindRegistry;

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Create a node of the given kind with a generated ID, shaped by the
/// process-wide registry.
pub fn create_node(kind: NodeKind, label: impl Into<String>) -> Node {
    create_node_in(KindRegistry::global(), kind, label, None)
}

/// Same as [`create_node`] but with a caller-chosen ID.
pub fn create_node_with_id(
    kind: NodeKind,
    label: impl Into<String>,
    id: impl Into<String>,
) -> Node {
    create_node_in(KindRegistry::global(), kind, label, Some(id.into()))
}

/// Core constructor against an explicit registry.
///
/// An unregistered kind falls back to one untyped input and one untyped
/// output port and no stamped duration.
pub fn create_node_in(
    registry: &KindRegistry,
    kind: NodeKind,
    label: impl Into<String>,
    id: Option<String>,
) -> Node {
    let (inputs, outputs, duration_ms) = match registry.descriptor(&kind) {
        Some(descriptor) => (
            descriptor.default_inputs,
            descriptor.default_outputs,
            descriptor.default_duration_ms,
        ),
        None => {
            warn!(kind = %kind, "no registered descriptor for kind; using defaults");
            (1, 1, None)
        }
    };

    let mut node = Node::new(
        id.unwrap_or_else(|| Uuid::new_v4().to_string()),
        kind,
        label,
    );
    node.duration_ms = duration_ms;
    node.ports.inputs = numbered_ports("input", "Input", inputs);
    node.ports.outputs = numbered_ports("output", "Output", outputs);
    node
}

/// Create a node with explicit untyped input/output port counts.
pub fn create_multi_port_node(
    kind: NodeKind,
    label: impl Into<String>,
    inputs: usize,
    outputs: usize,
) -> Node {
    let mut node = create_node(kind, label);
    node.ports.inputs = numbered_ports("input", "Input", inputs);
    node.ports.outputs = numbered_ports("output", "Output", outputs);
    node
}

/// Create a node whose ports carry declared types.
///
/// Port IDs follow the `input_A_1` convention: the type label plus the
/// 1-based position in the declared sequence.
pub fn create_typed_port_node(
    kind: NodeKind,
    label: impl Into<String>,
    input_types: &[PortType],
    output_types: &[PortType],
) -> Node {
    let mut node = create_node(kind, label);
    node.ports.inputs = typed_ports("input", input_types);
    node.ports.outputs = typed_ports("output", output_types);
    node
}

fn numbered_ports(prefix: &str, label_word: &str, count: usize) -> Vec<Port> {
    (1..=count)
        .map(|i| Port {
            id: format!("{prefix}_{i}"),
            label: Some(format!("{label_word} {i}")),
            port_type: None,
        })
        .collect()
}

fn typed_ports(prefix: &str, types: &[PortType]) -> Vec<Port> {
    types
        .iter()
        .enumerate()
        .map(|(index, port_type)| Port {
            id: format!("{prefix}_{port_type}_{}", index + 1),
            label: Some(format!("{port_type}-typed {prefix}")),
            port_type: Some(*port_type),
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Edges
// ---------------------------------------------------------------------------

/// Edge between two nodes' default ports, with the `e{source}-{target}`
/// ID convention.
pub fn create_edge(source: &str, target: &str) -> Edge {
    Edge::new(format!("e{source}-{target}"), source, target)
}

/// Edge addressing specific ports, with a generated ID.
pub fn create_port_edge(
    source: &str,
    source_port: Option<&str>,
    target: &str,
    target_port: Option<&str>,
) -> Edge {
    let mut edge = Edge::new(Uuid::new_v4().to_string(), source, target);
    edge.source_port = source_port.map(str::to_owned);
    edge.target_port = target_port.map(str::to_owned);
    edge
}
