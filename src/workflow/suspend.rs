use super::WorkflowState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies a traversal parked at the escalation gate
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeMarker {
    pub order_id: String,
    pub traversal_id: Uuid,
    /// Escalation fallout that the decision step is appended to
    pub fallout_id: i64,
    /// Text shown to the person making the decision
    pub summary: String,
    pub paused_at: DateTime<Utc>,
}

/// Everything a caller stores while waiting for a human decision.
///
/// Serializable so it can outlive the process that started the traversal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PausedTraversal {
    pub marker: ResumeMarker,
    pub state: WorkflowState,
}

impl PausedTraversal {
    pub fn order_id(&self) -> &str {
        &self.marker.order_id
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

/// Result of starting a traversal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum TraversalOutcome {
    Completed(WorkflowState),
    Suspended(PausedTraversal),
}

impl TraversalOutcome {
    pub fn state(&self) -> &WorkflowState {
        match self {
            Self::Completed(state) => state,
            Self::Suspended(paused) => &paused.state,
        }
    }

    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::Suspended(_))
    }

    pub fn into_completed(self) -> Option<WorkflowState> {
        match self {
            Self::Completed(state) => Some(state),
            Self::Suspended(_) => None,
        }
    }

    pub fn into_paused(self) -> Option<PausedTraversal> {
        match self {
            Self::Suspended(paused) => Some(paused),
            Self::Completed(_) => None,
        }
    }
}
