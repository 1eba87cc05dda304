//! # Workflow State
//!
//! Transient, per-traversal working memory and the serializable suspend
//! contract used at the escalation gate.
//!
//! The durable record of what happened lives in the audit store; a
//! [`WorkflowState`] is discarded once its traversal completes. While a
//! traversal waits for a human it is handed to the caller as a
//! [`PausedTraversal`], which resume takes back together with the decision.

pub mod diagnostics;
pub mod state;
pub mod suspend;

pub use diagnostics::{DiagnosticEntry, DiagnosticLog};
pub use state::{EscalationCause, WorkflowState};
pub use suspend::{PausedTraversal, ResumeMarker, TraversalOutcome};
