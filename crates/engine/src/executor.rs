//! The execution engine.
//!
//! `WorkflowEngine` drives every reachable node from `Idle` to `Completed`
//! in an order consistent with the edge dependencies, simulating each
//! node's processing time. A run is a worklist traversal seeded from the
//! entry-kind nodes followed by a convergence sweep that resolves join
//! dependencies across independently-seeded branches.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use chrono::Utc;
use graph::{Edge, NodeStatus, Workflow, WorkflowSnapshot};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::events::{EventSender, WorkflowEvent};
use crate::validator::{ConnectionCandidate, ConnectionValidator, ValidationOutcome};

// ---------------------------------------------------------------------------
// RunReport
// ---------------------------------------------------------------------------

/// What a finished run looked like, node IDs sorted.
///
/// `never_completed` lists the nodes the run left `Idle` — members of a
/// dependency cycle and anything downstream of one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub completed: Vec<String>,
    pub never_completed: Vec<String>,
}

// ---------------------------------------------------------------------------
// WorkflowEngine
// ---------------------------------------------------------------------------

/// The scheduler. Owns the graph, guards against re-entrant runs, and
/// publishes every status transition on its event channel.
///
/// Status mutations happen in short lock sections that are never held
/// across an await; the simulated per-node delay is the only suspension
/// point.
pub struct WorkflowEngine {
    graph: Mutex<Workflow>,
    running: AtomicBool,
    events: EventSender,
}

impl WorkflowEngine {
    pub fn new(workflow: Workflow, events: EventSender) -> Self {
        Self {
            graph: Mutex::new(workflow),
            running: AtomicBool::new(false),
            events,
        }
    }

    /// Whether a run is currently in flight.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    // -----------------------------------------------------------------------
    // Status updates
    // -----------------------------------------------------------------------

    /// Set a node's status and publish the transition. Unknown IDs are
    /// ignored.
    pub fn update_node_status(&self, node_id: &str, status: NodeStatus) {
        let updated = {
            let mut graph = self.lock_graph();
            match graph.node_mut(node_id) {
                Some(node) => {
                    node.status = status;
                    true
                }
                None => false,
            }
        };

        if updated {
            let _ = self.events.send(WorkflowEvent::StatusChanged {
                node_id: node_id.to_owned(),
                status,
                timestamp: Utc::now(),
            });
        }
    }

    /// Force every node back to `Idle`, publishing the transition for each
    /// node that actually changes. Idempotent; the only backward transition
    /// in the state machine.
    pub fn reset_all_nodes(&self) {
        let reset: Vec<String> = {
            let mut graph = self.lock_graph();
            let mut ids: Vec<String> = graph
                .nodes()
                .filter(|node| node.status != NodeStatus::Idle)
                .map(|node| node.id.clone())
                .collect();
            ids.sort();
            for id in &ids {
                if let Some(node) = graph.node_mut(id) {
                    node.status = NodeStatus::Idle;
                }
            }
            ids
        };

        for node_id in reset {
            let _ = self.events.send(WorkflowEvent::StatusChanged {
                node_id,
                status: NodeStatus::Idle,
                timestamp: Utc::now(),
            });
        }
    }

    pub fn node_status(&self, node_id: &str) -> Option<NodeStatus> {
        self.lock_graph().node_status(node_id)
    }

    // -----------------------------------------------------------------------
    // Running
    // -----------------------------------------------------------------------

    /// Run the workflow to its fixed point.
    ///
    /// Returns `None` without touching any node if a run is already in
    /// flight (at-most-one concurrent run). Otherwise resets the graph,
    /// walks it, and returns the report — which is also published as a
    /// [`WorkflowEvent::RunFinished`].
    #[instrument(skip(self))]
    pub async fn run_workflow(&self) -> Option<RunReport> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            debug!("run already in flight; request ignored");
            return None;
        }

        self.reset_all_nodes();
        let mut completed: HashSet<String> = HashSet::new();

        // Seed from the entry-kind nodes.
        let seeds: Vec<String> = {
            let graph = self.lock_graph();
            let mut seeds: Vec<String> = graph
                .nodes()
                .filter(|node| node.kind.is_entry())
                .map(|node| node.id.clone())
                .collect();
            seeds.sort();
            seeds
        };
        info!(seed_count = seeds.len(), "workflow run started");

        // Worklist pass: depth-first from each seed, successors in
        // edge-insertion order. A node that is not yet ready is skipped for
        // this branch; the sweep below picks it up once it becomes ready.
        let mut worklist: VecDeque<String> = seeds.into();
        while let Some(node_id) = worklist.pop_front() {
            if completed.contains(&node_id) {
                continue;
            }
            if !self.is_ready(&node_id, &completed) {
                continue;
            }
            self.execute_node(&node_id).await;
            completed.insert(node_id.clone());

            let successors = self.lock_graph().successors_of(&node_id);
            for successor in successors {
                worklist.push_back(successor);
            }
        }

        // Convergence sweep: rescan until a full pass makes no progress.
        // Guarantees completion for join-dependent nodes the seeded pass
        // could not order, and terminates on the no-change fixed point even
        // when a dependency cycle leaves nodes permanently unready.
        loop {
            let pending: Vec<String> = {
                let graph = self.lock_graph();
                graph
                    .node_ids_sorted()
                    .into_iter()
                    .filter(|id| !completed.contains(id))
                    .collect()
            };

            let mut progressed = false;
            for node_id in pending {
                if self.is_ready(&node_id, &completed) {
                    self.execute_node(&node_id).await;
                    completed.insert(node_id);
                    progressed = true;
                }
            }
            if !progressed {
                break;
            }
        }

        let never_completed: Vec<String> = {
            let graph = self.lock_graph();
            graph
                .node_ids_sorted()
                .into_iter()
                .filter(|id| !completed.contains(id))
                .collect()
        };
        if !never_completed.is_empty() {
            warn!(?never_completed, "nodes never became ready");
        }

        let mut completed: Vec<String> = completed.into_iter().collect();
        completed.sort();
        let report = RunReport {
            completed,
            never_completed,
        };

        let _ = self.events.send(WorkflowEvent::RunFinished {
            report: report.clone(),
            timestamp: Utc::now(),
        });
        info!(
            completed = report.completed.len(),
            stranded = report.never_completed.len(),
            "workflow run finished"
        );

        self.running.store(false, Ordering::SeqCst);
        Some(report)
    }

    /// Strict AND-join: every direct predecessor is completed. A node with
    /// no predecessors is ready immediately. Unknown IDs are never ready.
    fn is_ready(&self, node_id: &str, completed: &HashSet<String>) -> bool {
        let graph = self.lock_graph();
        graph.contains_node(node_id)
            && graph
                .predecessors_of(node_id)
                .iter()
                .all(|predecessor| completed.contains(predecessor))
    }

    /// Simulate one node: `Running`, wait its duration, `Completed`.
    async fn execute_node(&self, node_id: &str) {
        self.update_node_status(node_id, NodeStatus::Running);

        let duration_ms = self
            .lock_graph()
            .node(node_id)
            .map(|node| node.effective_duration_ms())
            .unwrap_or_default();
        tokio::time::sleep(Duration::from_millis(duration_ms)).await;

        self.update_node_status(node_id, NodeStatus::Completed);
        debug!(node_id, duration_ms, "node completed");
    }

    // -----------------------------------------------------------------------
    // Graph access and snapshot I/O
    // -----------------------------------------------------------------------

    /// Validator-gated edge insertion: the edge enters the graph only if the
    /// validator accepts it.
    pub fn try_add_edge(&self, validator: &ConnectionValidator, edge: Edge) -> ValidationOutcome {
        let mut graph = self.lock_graph();
        let outcome = validator.validate_connection(&ConnectionCandidate::from(&edge), &graph);
        if outcome.is_accepted() {
            graph.push_edge(edge);
        }
        outcome
    }

    /// Immutable copy of the full node and edge collections.
    pub fn export_workflow(&self) -> WorkflowSnapshot {
        self.lock_graph().snapshot()
    }

    /// Replace the graph wholesale. Trusted input: edges are not
    /// re-validated.
    pub fn import_workflow(&self, snapshot: WorkflowSnapshot) {
        *self.lock_graph() = Workflow::from_snapshot(snapshot);
    }

    /// Read access to the graph for queries that do not warrant a snapshot.
    pub fn with_graph<R>(&self, f: impl FnOnce(&Workflow) -> R) -> R {
        f(&self.lock_graph())
    }

    fn lock_graph(&self) -> std::sync::MutexGuard<'_, Workflow> {
        self.graph.lock().expect("graph lock poisoned")
    }
}
