//! Engine tests: run completeness, dependency ordering, reset semantics,
//! re-entrancy, cycle containment, and snapshot I/O.
//!
//! All timing runs against tokio's paused test clock, so the simulated
//! durations cost no wall time.

use std::sync::Arc;

use graph::{Edge, Node, NodeKind, NodeStatus, Workflow, WorkflowSnapshot};
use nodes::factory::create_node_in;
use nodes::KindRegistry;

use crate::events::{event_channel, EventReceiver, WorkflowEvent};
use crate::executor::WorkflowEngine;
use crate::validator::{notice_channel, ConnectionValidator, ValidationOutcome};

fn node(id: &str, kind: NodeKind) -> Node {
    Node::new(id, kind, format!("{id} label"))
}

/// ids[0] → ids[1] → … → ids[n-1], first node of entry kind.
fn linear_workflow(ids: &[&str]) -> Workflow {
    let mut workflow = Workflow::new();
    for (index, id) in ids.iter().enumerate() {
        let kind = if index == 0 {
            NodeKind::Input
        } else if index == ids.len() - 1 {
            NodeKind::Output
        } else {
            NodeKind::Process
        };
        workflow.insert_node(node(id, kind));
    }
    for pair in ids.windows(2) {
        workflow.push_edge(Edge::new(format!("e{}-{}", pair[0], pair[1]), pair[0], pair[1]));
    }
    workflow
}

/// Two branches joining on a shared sink: a → b → d, a → c → d.
fn diamond_workflow() -> Workflow {
    let mut workflow = Workflow::new();
    workflow.insert_node(node("a", NodeKind::Input));
    workflow.insert_node(node("b", NodeKind::Process));
    workflow.insert_node(node("c", NodeKind::Process));
    workflow.insert_node(node("d", NodeKind::Output));
    workflow.push_edge(Edge::new("e1", "a", "b"));
    workflow.push_edge(Edge::new("e2", "a", "c"));
    workflow.push_edge(Edge::new("e3", "b", "d"));
    workflow.push_edge(Edge::new("e4", "c", "d"));
    workflow
}

fn drain_status_events(receiver: &mut EventReceiver) -> Vec<(String, NodeStatus)> {
    let mut transitions = Vec::new();
    while let Ok(event) = receiver.try_recv() {
        if let WorkflowEvent::StatusChanged {
            node_id, status, ..
        } = event
        {
            transitions.push((node_id, status));
        }
    }
    transitions
}

fn position_of(
    transitions: &[(String, NodeStatus)],
    node_id: &str,
    status: NodeStatus,
) -> usize {
    transitions
        .iter()
        .position(|(id, s)| id == node_id && *s == status)
        .unwrap_or_else(|| panic!("no {status:?} transition for '{node_id}'"))
}

// ============================================================
// Run completeness and ordering
// ============================================================

#[tokio::test(start_paused = true)]
async fn linear_run_completes_every_node_in_order() {
    let (events, mut receiver) = event_channel();
    let engine = WorkflowEngine::new(linear_workflow(&["a", "b", "c"]), events);

    let report = engine.run_workflow().await.expect("run should start");
    assert_eq!(report.completed, vec!["a", "b", "c"]);
    assert!(report.never_completed.is_empty());

    for id in ["a", "b", "c"] {
        assert_eq!(engine.node_status(id), Some(NodeStatus::Completed));
    }

    // Every edge (u → v): u completes strictly before v starts.
    let transitions = drain_status_events(&mut receiver);
    for (u, v) in [("a", "b"), ("b", "c")] {
        assert!(
            position_of(&transitions, u, NodeStatus::Completed)
                < position_of(&transitions, v, NodeStatus::Running),
            "'{u}' must complete before '{v}' starts"
        );
    }
}

#[tokio::test(start_paused = true)]
async fn diamond_join_waits_for_both_branches() {
    let (events, mut receiver) = event_channel();
    let engine = WorkflowEngine::new(diamond_workflow(), events);

    let report = engine.run_workflow().await.expect("run should start");
    assert_eq!(report.completed, vec!["a", "b", "c", "d"]);

    let transitions = drain_status_events(&mut receiver);
    let a_done = position_of(&transitions, "a", NodeStatus::Completed);
    let d_running = position_of(&transitions, "d", NodeStatus::Running);

    // A completes first; D starts only after both B and C completed.
    assert!(a_done < position_of(&transitions, "b", NodeStatus::Running));
    assert!(a_done < position_of(&transitions, "c", NodeStatus::Running));
    assert!(position_of(&transitions, "b", NodeStatus::Completed) < d_running);
    assert!(position_of(&transitions, "c", NodeStatus::Completed) < d_running);
}

#[tokio::test(start_paused = true)]
async fn sweep_resolves_a_join_fed_by_a_non_entry_branch() {
    // a(Input) → j, solo(Process, no predecessors) → j. The worklist pass
    // skips j (solo not yet completed) and never reaches solo; the
    // convergence sweep completes solo and then j.
    let mut workflow = Workflow::new();
    workflow.insert_node(node("a", NodeKind::Input));
    workflow.insert_node(node("solo", NodeKind::Process));
    workflow.insert_node(node("j", NodeKind::Output));
    workflow.push_edge(Edge::new("e1", "a", "j"));
    workflow.push_edge(Edge::new("e2", "solo", "j"));

    let (events, _receiver) = event_channel();
    let engine = WorkflowEngine::new(workflow, events);

    let report = engine.run_workflow().await.expect("run should start");
    assert_eq!(report.completed, vec!["a", "j", "solo"]);
    assert!(report.never_completed.is_empty());
}

#[tokio::test(start_paused = true)]
async fn simulated_durations_add_up_on_the_clock() {
    // input 1500 (kind default) + process override 100 + output 1000.
    let mut workflow = linear_workflow(&["a", "b", "c"]);
    workflow.node_mut("b").expect("node b").duration_ms = Some(100);

    let (events, _receiver) = event_channel();
    let engine = WorkflowEngine::new(workflow, events);

    let started = tokio::time::Instant::now();
    engine.run_workflow().await.expect("run should start");
    assert_eq!(started.elapsed().as_millis(), 1500 + 100 + 1000);
}

// ============================================================
// Reset
// ============================================================

#[tokio::test(start_paused = true)]
async fn reset_is_idempotent_and_publishes_only_real_transitions() {
    let (events, mut receiver) = event_channel();
    let engine = WorkflowEngine::new(linear_workflow(&["a", "b"]), events);

    engine.run_workflow().await.expect("run should start");
    let _ = drain_status_events(&mut receiver);

    engine.reset_all_nodes();
    let first = drain_status_events(&mut receiver);
    assert_eq!(first.len(), 2);
    assert!(first.iter().all(|(_, status)| *status == NodeStatus::Idle));

    // Second reset changes nothing and stays silent.
    engine.reset_all_nodes();
    assert!(drain_status_events(&mut receiver).is_empty());
    for id in ["a", "b"] {
        assert_eq!(engine.node_status(id), Some(NodeStatus::Idle));
    }
}

// ============================================================
// Re-entrancy
// ============================================================

#[tokio::test(start_paused = true)]
async fn a_second_run_request_is_ignored_while_one_is_in_flight() {
    let (events, _receiver) = event_channel();
    let engine = Arc::new(WorkflowEngine::new(linear_workflow(&["a", "b"]), events));

    let first = tokio::spawn({
        let engine = Arc::clone(&engine);
        async move { engine.run_workflow().await }
    });

    // Let the first run reach its first simulated delay.
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
    assert!(engine.is_running());

    // The re-entrant request returns immediately, without a report.
    assert!(engine.run_workflow().await.is_none());

    let report = first.await.expect("task").expect("first run should finish");
    assert_eq!(report.completed, vec!["a", "b"]);
    assert!(!engine.is_running());
}

// ============================================================
// Cycle containment
// ============================================================

#[tokio::test(start_paused = true)]
async fn cycle_nodes_stay_idle_and_the_run_still_terminates() {
    // a(Input) completes; x ⇄ y gate each other forever.
    let mut workflow = Workflow::new();
    workflow.insert_node(node("a", NodeKind::Input));
    workflow.insert_node(node("x", NodeKind::Process));
    workflow.insert_node(node("y", NodeKind::Process));
    workflow.push_edge(Edge::new("e1", "x", "y"));
    workflow.push_edge(Edge::new("e2", "y", "x"));

    let (events, mut receiver) = event_channel();
    let engine = WorkflowEngine::new(workflow, events);

    let report = engine.run_workflow().await.expect("run should start");
    assert_eq!(report.completed, vec!["a"]);
    assert_eq!(report.never_completed, vec!["x", "y"]);
    assert_eq!(engine.node_status("x"), Some(NodeStatus::Idle));
    assert_eq!(engine.node_status("y"), Some(NodeStatus::Idle));

    // The report is also observable on the event stream.
    let mut finished = None;
    while let Ok(event) = receiver.try_recv() {
        if let WorkflowEvent::RunFinished { report, .. } = event {
            finished = Some(report);
        }
    }
    assert_eq!(finished.expect("RunFinished event").never_completed, vec!["x", "y"]);
}

#[tokio::test(start_paused = true)]
async fn an_isolated_node_with_no_predecessors_completes_in_the_sweep() {
    let mut workflow = Workflow::new();
    workflow.insert_node(node("a", NodeKind::Input));
    workflow.insert_node(node("solo", NodeKind::Filter));

    let (events, _receiver) = event_channel();
    let engine = WorkflowEngine::new(workflow, events);

    let report = engine.run_workflow().await.expect("run should start");
    assert_eq!(report.completed, vec!["a", "solo"]);
}

// ============================================================
// Snapshot I/O and gated insertion
// ============================================================

#[tokio::test]
async fn import_replaces_the_graph_wholesale_without_validation() {
    let (events, _receiver) = event_channel();
    let engine = WorkflowEngine::new(linear_workflow(&["a", "b"]), events);

    // A snapshot the validator would reject edge-wise: typed ports A → B.
    let registry = KindRegistry::with_builtins();
    let mut source = create_node_in(&registry, NodeKind::Input, "Input node 1", Some("in".into()));
    source.ports.outputs[0].port_type = Some(graph::PortType::A);
    let mut target =
        create_node_in(&registry, NodeKind::Output, "Output node 1", Some("out".into()));
    target.ports.inputs[0].port_type = Some(graph::PortType::B);

    let mut edge = Edge::new("e1", "in", "out");
    edge.source_port = Some("output_1".into());
    edge.target_port = Some("input_1".into());

    engine.import_workflow(WorkflowSnapshot {
        nodes: vec![source, target],
        edges: vec![edge],
    });

    let snapshot = engine.export_workflow();
    let ids: Vec<&str> = snapshot.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["in", "out"]);
    // The mismatched edge was admitted untouched.
    assert_eq!(snapshot.edges.len(), 1);
    assert_eq!(snapshot.edges[0].id, "e1");
}

#[tokio::test]
async fn try_add_edge_inserts_only_accepted_edges() {
    let registry = KindRegistry::with_builtins();
    let mut workflow = Workflow::new();
    workflow.insert_node(create_node_in(
        &registry,
        NodeKind::Input,
        "Input node 1",
        Some("in".into()),
    ));
    workflow.insert_node(create_node_in(
        &registry,
        NodeKind::Process,
        "Process node 1",
        Some("proc".into()),
    ));

    let (events, _receiver) = event_channel();
    let engine = WorkflowEngine::new(workflow, events);
    let (notices, _notice_receiver) = notice_channel();
    let validator = ConnectionValidator::new(notices);

    let good = Edge::new("e-good", "in", "proc");
    assert!(engine.try_add_edge(&validator, good).is_accepted());

    // Source port that is actually an input: direction violation.
    let mut bad = Edge::new("e-bad", "proc", "in");
    bad.source_port = Some("input_1".into());
    assert!(matches!(
        engine.try_add_edge(&validator, bad),
        ValidationOutcome::Rejected(Some(_))
    ));

    let snapshot = engine.export_workflow();
    let edge_ids: Vec<&str> = snapshot.edges.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(edge_ids, vec!["e-good"]);
}
