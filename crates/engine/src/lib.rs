//! `engine` crate — the connection validator, the dependency-driven
//! execution engine, and the snapshot audit.
//!
//! The validator is the sole gate an edge passes before entering the graph;
//! once admitted, the engine trusts it. A run walks the graph from its
//! entry nodes, honors the all-predecessors-completed readiness rule, and
//! publishes every status transition on the event channel.

pub mod audit;
pub mod events;
pub mod executor;
pub mod validator;

pub use audit::{audit_snapshot, AuditIssue};
pub use events::{event_channel, EventReceiver, EventSender, WorkflowEvent};
pub use executor::{RunReport, WorkflowEngine};
pub use validator::{
    check_connection, notice_channel, ConnectionCandidate, ConnectionValidator, NoticeReceiver,
    NoticeSender, RejectReason, ValidationNotice, ValidationOutcome,
};

#[cfg(test)]
mod executor_tests;
