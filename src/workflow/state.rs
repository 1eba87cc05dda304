use super::DiagnosticLog;
use crate::state_machine::{
    determine_target_status, NodeTarget, ResolutionEvent, ResolutionStatus, StateMachineError,
    StateMachineResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Why a traversal ended up at the escalation gate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum EscalationCause {
    /// Classifier returned `human`
    Classified,
    /// Classifier returned something outside the label set
    UnrecognizedLabel(String),
    /// Classifier call itself failed
    ClassifierError(String),
    /// A specialist handler failed or panicked
    HandlerFault { handler: String, reason: String },
}

impl fmt::Display for EscalationCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classified => write!(f, "classified for human review"),
            Self::UnrecognizedLabel(raw) => {
                write!(f, "unrecognized routing label {raw:?} mapped to human")
            }
            Self::ClassifierError(reason) => write!(f, "classifier failed: {reason}"),
            Self::HandlerFault { handler, reason } => {
                write!(f, "handler fault in {handler}: {reason}")
            }
        }
    }
}

/// Working memory of one traversal.
///
/// Created fresh at traversal start and threaded through every node.
/// `actions_taken` and the diagnostic log only ever grow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub traversal_id: Uuid,
    pub order_id: String,
    actions_taken: Vec<String>,
    resolution_status: ResolutionStatus,
    pub next_target: NodeTarget,
    pub diagnostics: DiagnosticLog,
    pub escalation_cause: Option<EscalationCause>,
    visited: Vec<NodeTarget>,
}

impl WorkflowState {
    pub fn new(order_id: impl Into<String>) -> Self {
        Self {
            traversal_id: Uuid::new_v4(),
            order_id: order_id.into(),
            actions_taken: Vec::new(),
            resolution_status: ResolutionStatus::Pending,
            next_target: NodeTarget::Master,
            diagnostics: DiagnosticLog::new(),
            escalation_cause: None,
            visited: Vec::new(),
        }
    }

    pub fn actions_taken(&self) -> &[String] {
        &self.actions_taken
    }

    pub fn resolution_status(&self) -> ResolutionStatus {
        self.resolution_status
    }

    pub fn visited(&self) -> &[NodeTarget] {
        &self.visited
    }

    pub fn record_action(&mut self, action: impl Into<String>) {
        self.actions_taken.push(action.into());
    }

    /// Move the resolution status along the allowed graph
    pub fn transition(&mut self, event: &ResolutionEvent) -> StateMachineResult<ResolutionStatus> {
        let target = determine_target_status(self.resolution_status, event)?;
        tracing::debug!(
            order_id = %self.order_id,
            traversal_id = %self.traversal_id,
            from = %self.resolution_status,
            to = %target,
            event = event.event_type(),
            "Resolution status transition"
        );
        self.resolution_status = target;
        Ok(target)
    }

    /// Mark a node as running. Each node runs at most once per traversal.
    pub fn enter(&mut self, node: NodeTarget) -> StateMachineResult<()> {
        if self.visited.contains(&node) {
            return Err(StateMachineError::NodeRevisited {
                node: node.to_string(),
            });
        }
        self.visited.push(node);
        Ok(())
    }

    pub fn is_terminal(&self) -> bool {
        self.next_target.is_terminal() && self.resolution_status.is_terminal()
    }

    pub fn is_suspended(&self) -> bool {
        self.resolution_status.is_suspended() && self.next_target == NodeTarget::HumanResume
    }
}
