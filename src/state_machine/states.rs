use serde::{Deserialize, Serialize};
use std::fmt;

/// Resolution status carried by a traversal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStatus {
    /// Traversal created, routing has not run yet
    #[default]
    Pending,
    /// Routed to a node that is working on the order
    InProgress,
    /// Remediated automatically or approved by a human
    Resolved,
    /// Left with a human after rejection or an unrecognized decision
    Escalated,
    /// Suspended at the escalation gate until a human decision arrives
    WaitingInput,
}

impl ResolutionStatus {
    /// Check if this is a terminal status (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolved | Self::Escalated)
    }

    /// Check if the traversal is parked waiting for external input
    pub fn is_suspended(&self) -> bool {
        matches!(self, Self::WaitingInput)
    }
}

impl fmt::Display for ResolutionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Resolved => write!(f, "resolved"),
            Self::Escalated => write!(f, "escalated"),
            Self::WaitingInput => write!(f, "waiting_input"),
        }
    }
}

impl std::str::FromStr for ResolutionStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "in_progress" => Ok(Self::InProgress),
            "resolved" => Ok(Self::Resolved),
            "escalated" => Ok(Self::Escalated),
            "waiting_input" => Ok(Self::WaitingInput),
            _ => Err(format!("Invalid resolution status: {s}")),
        }
    }
}

/// Nodes of the routing graph
///
/// `master -> {resubmission | esim | switch | human_escalate} -> [human_resume] -> completed`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeTarget {
    /// Routing node, always the entry point
    #[default]
    Master,
    Resubmission,
    Esim,
    Switch,
    HumanEscalate,
    HumanResume,
    Completed,
}

impl NodeTarget {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Master => "master",
            Self::Resubmission => "resubmission",
            Self::Esim => "esim",
            Self::Switch => "switch",
            Self::HumanEscalate => "human_escalate",
            Self::HumanResume => "human_resume",
            Self::Completed => "completed",
        }
    }

    /// Specialist nodes perform automated remediation
    pub fn is_specialist(&self) -> bool {
        matches!(self, Self::Resubmission | Self::Esim | Self::Switch)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl fmt::Display for NodeTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NodeTarget {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "master" => Ok(Self::Master),
            "resubmission" => Ok(Self::Resubmission),
            "esim" => Ok(Self::Esim),
            "switch" => Ok(Self::Switch),
            "human_escalate" => Ok(Self::HumanEscalate),
            "human_resume" => Ok(Self::HumanResume),
            "completed" => Ok(Self::Completed),
            _ => Err(format!("Invalid node target: {s}")),
        }
    }
}
