//! The starter workflow and the demo host-kind registrations.
//!
//! `sample_workflow` reproduces the editor's initial graph: a linear
//! Input → Process → Transform → Output chain, a multi-port process node fed
//! from two places, and a typed-port custom node spliced into the chain.

use graph::{Edge, NodeKind, PortType, WorkflowSnapshot};

use crate::factory::{create_multi_port_node, create_node_with_id, create_typed_port_node};
use crate::registry::{KindDescriptor, KindRegistry};

/// The starter graph: six nodes, eight edges.
pub fn sample_workflow() -> WorkflowSnapshot {
    let input_1 = create_node_with_id(NodeKind::Input, "Input node 1", "input-1");
    let process_1 = create_node_with_id(NodeKind::Process, "Process node 1", "process-1");
    let transform_1 = create_node_with_id(NodeKind::Transform, "Transform node 1", "transform-1");
    let output_1 = create_node_with_id(NodeKind::Output, "Output node 1", "output-1");

    let mut multi_port_1 = create_multi_port_node(NodeKind::Process, "Multi-port node", 3, 2);
    multi_port_1.id = "multi-port-1".into();
    multi_port_1.duration_ms = Some(4000);

    let mut typed_port_1 = create_typed_port_node(
        NodeKind::Custom,
        "Typed-port node",
        &[PortType::A, PortType::B, PortType::C],
        &[PortType::A, PortType::B, PortType::C],
    );
    typed_port_1.id = "typed-port-1".into();
    typed_port_1.duration_ms = Some(2500);

    let mut edges = vec![
        Edge::new("edge-1", "input-1", "process-1"),
        Edge::new("edge-2", "process-1", "transform-1"),
        Edge::new("edge-3", "transform-1", "output-1"),
        Edge::new("edge-4", "input-1", "multi-port-1"),
        Edge::new("edge-5", "process-1", "multi-port-1"),
        Edge::new("edge-6", "multi-port-1", "output-1"),
        Edge::new("edge-7", "transform-1", "typed-port-1"),
        Edge::new("edge-8", "typed-port-1", "output-1"),
    ];
    edges[3].target_port = Some("input_1".into());
    edges[4].target_port = Some("input_2".into());
    edges[5].source_port = Some("output_1".into());
    edges[6].target_port = Some("input_A_1".into());
    edges[7].source_port = Some("output_B_2".into());
    edges[7].target_port = Some("input_1".into());

    WorkflowSnapshot {
        nodes: vec![
            input_1,
            process_1,
            transform_1,
            output_1,
            multi_port_1,
            typed_port_1,
        ],
        edges,
    }
}

/// The demo host-kind registrations: a timer and a typed database node.
pub fn register_demo_kinds(registry: &mut KindRegistry) {
    registry.register(
        "timer",
        KindDescriptor {
            display_name: "Timer node".into(),
            default_inputs: 1,
            default_outputs: 2,
            typed_ports: false,
            default_duration_ms: Some(1500),
        },
    );
    registry.register(
        "database",
        KindDescriptor {
            display_name: "Database node".into(),
            default_inputs: 1,
            default_outputs: 2,
            typed_ports: true,
            default_duration_ms: None,
        },
    );
}
