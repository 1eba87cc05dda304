//! # Node Handlers
//!
//! The nodes a traversal can visit after routing.
//!
//! - [`RemediationHandler`]: the three specialists (resubmission, eSIM,
//!   switch). Each owns one sub-status, applies a single compare-and-set
//!   remediation when its trigger holds and otherwise explains why nothing
//!   was done.
//! - [`EscalationGate`]: the two-phase human path. `escalate` records the
//!   case and suspends; `resume` consumes one decision and finishes.
//!
//! Handlers receive the store at construction time and take the
//! [`WorkflowState`](crate::workflow::WorkflowState) by value, returning it
//! updated.

pub mod escalation;
pub mod specialist;

pub use escalation::{DecisionOutcome, EscalationGate};
pub use specialist::{RemediationHandler, RemediationPlan};

use crate::error::Result;
use crate::state_machine::NodeTarget;
use crate::workflow::WorkflowState;
use async_trait::async_trait;
use std::any::Any;

/// A node that runs to completion and hands the state back
#[async_trait]
pub trait NodeHandler: Send + Sync {
    fn node(&self) -> NodeTarget;

    /// Actor name written to the audit trail
    fn actor(&self) -> &'static str;

    async fn handle(&self, state: WorkflowState) -> Result<WorkflowState>;
}

/// Text of a caught panic payload
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
