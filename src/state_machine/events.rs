use serde::{Deserialize, Serialize};

/// Events that drive resolution status transitions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum ResolutionEvent {
    /// Routing node picked a target
    Route,
    /// A node finished its work successfully
    Resolve,
    /// Escalation gate parked the traversal
    Suspend,
    /// A human decision left the order with the human team
    Escalate(String),
}

impl ResolutionEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::Resolve => "resolve",
            Self::Suspend => "suspend",
            Self::Escalate(_) => "escalate",
        }
    }

    pub fn reason(&self) -> Option<&str> {
        match self {
            Self::Escalate(reason) => Some(reason),
            _ => None,
        }
    }

    /// Check if this event ends a traversal
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Resolve | Self::Escalate(_))
    }
}

impl ResolutionEvent {
    pub fn escalate_with_reason(reason: impl Into<String>) -> Self {
        Self::Escalate(reason.into())
    }
}
