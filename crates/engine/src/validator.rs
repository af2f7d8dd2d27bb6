//! Connection validation — the sole gate between a candidate edge and the
//! graph.
//!
//! The decision itself is a pure function over the candidate and the current
//! graph. The stateful [`ConnectionValidator`] wraps it with the notice
//! contract: a rejection with a reason surfaces a transient message and
//! schedules its dismissal 3000 ms later, with at most one dismissal timer
//! in flight.

use std::sync::Mutex;
use std::time::Duration;

use graph::{Node, PortType, Workflow};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

/// How long a validation notice stays up before auto-dismissal.
const NOTICE_DISMISS_AFTER: Duration = Duration::from_millis(3000);

// ---------------------------------------------------------------------------
// Candidate and outcome
// ---------------------------------------------------------------------------

/// A proposed edge, as the editing surface describes it mid-gesture.
///
/// Port references are optional: an absent reference addresses the node's
/// implicit default port, which is output-capable on the source side and
/// input-capable on the target side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionCandidate {
    pub source: String,
    pub source_port: Option<String>,
    pub target: String,
    pub target_port: Option<String>,
}

impl From<&graph::Edge> for ConnectionCandidate {
    fn from(edge: &graph::Edge) -> Self {
        Self {
            source: edge.source.clone(),
            source_port: edge.source_port.clone(),
            target: edge.target.clone(),
            target_port: edge.target_port.clone(),
        }
    }
}

/// Why a candidate was turned away.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RejectReason {
    Direction,

    TypeMismatch { source: PortType, target: PortType },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::Direction => f.write_str(
                "connection failed: only an output port can feed an input port",
            ),
            RejectReason::TypeMismatch { source, target } => write!(
                f,
                "connection failed: {source}-typed output does not match \
                 {target}-typed input (types must be identical)"
            ),
        }
    }
}

impl std::error::Error for RejectReason {}

/// The validator's verdict on a candidate.
///
/// `Rejected(None)` means the candidate could not be resolved against the
/// graph — an expected transient state while an edge is being drawn, turned
/// away without a user-facing message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationOutcome {
    Accepted,
    Rejected(Option<RejectReason>),
}

impl ValidationOutcome {
    pub fn is_accepted(&self) -> bool {
        matches!(self, ValidationOutcome::Accepted)
    }
}

// ---------------------------------------------------------------------------
// Pure decision
// ---------------------------------------------------------------------------

/// Decide whether the candidate may enter the graph.
///
/// Direction rule first, then type compatibility. No cycle, duplicate-edge,
/// or arity checks happen here.
pub fn check_connection(
    candidate: &ConnectionCandidate,
    workflow: &Workflow,
) -> ValidationOutcome {
    let Some(source_node) = workflow.node(&candidate.source) else {
        return ValidationOutcome::Rejected(None);
    };
    let Some(target_node) = workflow.node(&candidate.target) else {
        return ValidationOutcome::Rejected(None);
    };

    let source_type = match resolve_source_port(source_node, candidate.source_port.as_deref()) {
        Ok(port_type) => port_type,
        Err(outcome) => return outcome,
    };
    let target_type = match resolve_target_port(target_node, candidate.target_port.as_deref()) {
        Ok(port_type) => port_type,
        Err(outcome) => return outcome,
    };

    // Untyped on either side is a wildcard.
    if let (Some(source), Some(target)) = (source_type, target_type) {
        if source != target {
            return ValidationOutcome::Rejected(Some(RejectReason::TypeMismatch {
                source,
                target,
            }));
        }
    }

    ValidationOutcome::Accepted
}

/// Resolve the source side to its declared type, if any.
///
/// A port ID found among the node's *inputs* is a direction violation; one
/// found on neither side is a dangling reference (silent rejection).
fn resolve_source_port(
    node: &Node,
    port_id: Option<&str>,
) -> Result<Option<PortType>, ValidationOutcome> {
    let Some(port_id) = port_id else {
        return Ok(None); // implicit default port, output-capable, untyped
    };
    if let Some(port) = node.ports.outputs.iter().find(|p| p.id == port_id) {
        return Ok(port.port_type);
    }
    if node.ports.inputs.iter().any(|p| p.id == port_id) {
        return Err(ValidationOutcome::Rejected(Some(RejectReason::Direction)));
    }
    Err(ValidationOutcome::Rejected(None))
}

fn resolve_target_port(
    node: &Node,
    port_id: Option<&str>,
) -> Result<Option<PortType>, ValidationOutcome> {
    let Some(port_id) = port_id else {
        return Ok(None); // implicit default port, input-capable, untyped
    };
    if let Some(port) = node.ports.inputs.iter().find(|p| p.id == port_id) {
        return Ok(port.port_type);
    }
    if node.ports.outputs.iter().any(|p| p.id == port_id) {
        return Err(ValidationOutcome::Rejected(Some(RejectReason::Direction)));
    }
    Err(ValidationOutcome::Rejected(None))
}

// ---------------------------------------------------------------------------
// Notices
// ---------------------------------------------------------------------------

/// Transient validation feedback for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum ValidationNotice {
    Show { message: String },
    Dismiss,
}

pub type NoticeSender = mpsc::UnboundedSender<ValidationNotice>;
pub type NoticeReceiver = mpsc::UnboundedReceiver<ValidationNotice>;

/// Create the notice channel a [`ConnectionValidator`] publishes on.
pub fn notice_channel() -> (NoticeSender, NoticeReceiver) {
    mpsc::unbounded_channel()
}

// ---------------------------------------------------------------------------
// ConnectionValidator
// ---------------------------------------------------------------------------

/// The stateful validator: pure decision plus the notice timer.
///
/// Its only state is the at-most-one pending dismissal task.
pub struct ConnectionValidator {
    notices: NoticeSender,
    pending_dismissal: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionValidator {
    pub fn new(notices: NoticeSender) -> Self {
        Self {
            notices,
            pending_dismissal: Mutex::new(None),
        }
    }

    /// Validate a candidate against the current graph.
    ///
    /// A rejection with a reason publishes a `Show` notice and schedules its
    /// `Dismiss`; a newer rejection replaces any pending timer. Must be
    /// called within a tokio runtime.
    pub fn validate_connection(
        &self,
        candidate: &ConnectionCandidate,
        workflow: &Workflow,
    ) -> ValidationOutcome {
        let outcome = check_connection(candidate, workflow);
        if let ValidationOutcome::Rejected(Some(reason)) = &outcome {
            debug!(source = %candidate.source, target = %candidate.target, %reason, "connection rejected");
            self.show_notice(reason.to_string());
        }
        outcome
    }

    /// Cancel any pending auto-dismissal and hide the notice immediately.
    /// Called when the editing surface is torn down.
    pub fn clear_validation(&self) {
        self.abort_pending();
        let _ = self.notices.send(ValidationNotice::Dismiss);
    }

    fn show_notice(&self, message: String) {
        let _ = self.notices.send(ValidationNotice::Show { message });

        self.abort_pending();
        let notices = self.notices.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(NOTICE_DISMISS_AFTER).await;
            let _ = notices.send(ValidationNotice::Dismiss);
        });
        *self
            .pending_dismissal
            .lock()
            .expect("dismissal lock poisoned") = Some(handle);
    }

    fn abort_pending(&self) {
        if let Some(handle) = self
            .pending_dismissal
            .lock()
            .expect("dismissal lock poisoned")
            .take()
        {
            handle.abort();
        }
    }
}

impl Drop for ConnectionValidator {
    fn drop(&mut self) {
        self.abort_pending();
    }
}
