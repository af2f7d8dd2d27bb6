//! Engine events, published so a presentation layer can re-render.

use chrono::{DateTime, Utc};
use graph::NodeStatus;
use serde::Serialize;
use tokio::sync::mpsc;

use crate::executor::RunReport;

/// Everything observable about a run.
#[derive(Debug, Clone, Serialize)]
pub enum WorkflowEvent {
    /// A node moved to a new status. Every transition the engine makes is
    /// published; none is dropped.
    StatusChanged {
        node_id: String,
        status: NodeStatus,
        timestamp: DateTime<Utc>,
    },

    /// A run reached its fixed point.
    RunFinished {
        report: RunReport,
        timestamp: DateTime<Utc>,
    },
}

pub type EventSender = mpsc::UnboundedSender<WorkflowEvent>;
pub type EventReceiver = mpsc::UnboundedReceiver<WorkflowEvent>;

/// Create the event channel a [`crate::WorkflowEngine`] publishes on.
pub fn event_channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn events_arrive_in_publish_order() {
        let (sender, mut receiver) = event_channel();

        sender
            .send(WorkflowEvent::StatusChanged {
                node_id: "node-1".into(),
                status: NodeStatus::Running,
                timestamp: Utc::now(),
            })
            .unwrap();
        sender
            .send(WorkflowEvent::StatusChanged {
                node_id: "node-1".into(),
                status: NodeStatus::Completed,
                timestamp: Utc::now(),
            })
            .unwrap();

        match receiver.recv().await.unwrap() {
            WorkflowEvent::StatusChanged { status, .. } => {
                assert_eq!(status, NodeStatus::Running);
            }
            other => panic!("unexpected event: {other:?}"),
        }
        match receiver.recv().await.unwrap() {
            WorkflowEvent::StatusChanged { status, .. } => {
                assert_eq!(status, NodeStatus::Completed);
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }
}
