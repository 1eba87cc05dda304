use crate::classifier::Classifier;
use crate::constants::{actors, decisions, resolution_kinds, step_actions};
use crate::context::OrderContextProvider;
use crate::error::{FalloutError, Result};
use crate::handlers::panic_message;
use crate::logging::log_audit_operation;
use crate::models::{NewFallout, NewResolutionStep, OrderSnapshot, ResolutionHistory};
use crate::state_machine::{NodeTarget, ResolutionEvent, ResolutionStatus};
use crate::store::AuditStore;
use crate::workflow::{EscalationCause, PausedTraversal, ResumeMarker, WorkflowState};
use chrono::Utc;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Parsed human decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum DecisionOutcome {
    Approved,
    Rejected,
    Unrecognized(String),
}

impl DecisionOutcome {
    /// Lowercase and trim, then compare against the two known tokens
    pub fn from_input(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            decisions::APPROVE => Self::Approved,
            decisions::REJECT => Self::Rejected,
            _ => Self::Unrecognized(raw.to_string()),
        }
    }

    pub fn event(&self) -> ResolutionEvent {
        match self {
            Self::Approved => ResolutionEvent::Resolve,
            Self::Rejected => ResolutionEvent::escalate_with_reason("rejected by human reviewer"),
            Self::Unrecognized(raw) => {
                ResolutionEvent::escalate_with_reason(format!("unrecognized decision input: {raw}"))
            }
        }
    }

    pub fn final_status(&self) -> ResolutionStatus {
        match self {
            Self::Approved => ResolutionStatus::Resolved,
            Self::Rejected | Self::Unrecognized(_) => ResolutionStatus::Escalated,
        }
    }
}

/// Cut a rationale to at most `max_chars` characters on a char boundary,
/// ending in `...` when anything was dropped
pub fn truncate_rationale(rationale: &str, max_chars: usize) -> String {
    if rationale.chars().count() <= max_chars {
        return rationale.to_string();
    }
    const MARKER: &str = "...";
    if max_chars <= MARKER.len() {
        return rationale.chars().take(max_chars).collect();
    }
    let mut truncated: String = rationale.chars().take(max_chars - MARKER.len()).collect();
    truncated.push_str(MARKER);
    truncated
}

/// Two-phase human path: escalate and suspend, then resume once
pub struct EscalationGate {
    context: OrderContextProvider,
    store: Arc<dyn AuditStore>,
    classifier: Arc<dyn Classifier>,
    rationale_max_chars: usize,
}

impl std::fmt::Debug for EscalationGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EscalationGate")
            .field("rationale_max_chars", &self.rationale_max_chars)
            .finish_non_exhaustive()
    }
}

impl EscalationGate {
    pub fn new(
        store: Arc<dyn AuditStore>,
        classifier: Arc<dyn Classifier>,
        rationale_max_chars: usize,
    ) -> Self {
        Self {
            context: OrderContextProvider::new(store.clone()),
            store,
            classifier,
            rationale_max_chars,
        }
    }

    async fn rationale(
        &self,
        cause: &EscalationCause,
        snapshot: &OrderSnapshot,
        history: &ResolutionHistory,
    ) -> String {
        if let EscalationCause::HandlerFault { .. } = cause {
            return format!("Escalated after {cause}");
        }
        let explained = AssertUnwindSafe(self.classifier.explain(snapshot, history))
            .catch_unwind()
            .await;
        let failure = match explained {
            Ok(Ok(explanation)) => return format!("Escalated: {cause}. {explanation}"),
            Ok(Err(e)) => e.to_string(),
            Err(payload) => format!("panicked: {}", panic_message(payload.as_ref())),
        };
        warn!(error = %failure, "Rationale oracle failed, using fallback rationale");
        format!(
            "Escalated: {cause}. Rationale unavailable ({failure}); {}",
            snapshot.describe()
        )
    }

    /// Phase 1: record the escalation and park the traversal.
    ///
    /// Failures to load the order or write the escalation are returned as-is.
    #[instrument(skip(self, state), fields(order_id = %state.order_id, traversal_id = %state.traversal_id))]
    pub async fn escalate(&self, mut state: WorkflowState) -> Result<PausedTraversal> {
        let node = NodeTarget::HumanEscalate;
        let cause = state
            .escalation_cause
            .clone()
            .unwrap_or(EscalationCause::Classified);

        let snapshot = self.context.get_order_details(&state.order_id).await?;
        let history = self.context.resolution_history(&state.order_id).await?;
        let rationale = self.rationale(&cause, &snapshot, &history).await;
        let detail = truncate_rationale(&rationale, self.rationale_max_chars);

        let actor = match cause {
            EscalationCause::HandlerFault { .. } => actors::WORKFLOW_ENGINE,
            _ => actors::MASTER_AGENT,
        };
        let fallout_id = self
            .store
            .record_fallout(
                NewFallout::escalated(
                    &state.order_id,
                    actor,
                    resolution_kinds::HUMAN_ESCALATION,
                    detail.clone(),
                ),
                NewResolutionStep::new(actor, step_actions::ESCALATE_TO_HUMAN, rationale.clone()),
            )
            .await?;
        log_audit_operation(
            "escalate",
            &state.order_id,
            Some(fallout_id),
            actor,
            Some(resolution_kinds::HUMAN_ESCALATION),
        );

        state.record_action(format!(
            "Escalated order {} to human review (fallout {fallout_id})",
            state.order_id
        ));
        state.diagnostics.record(node, "cause", cause.to_string());
        state.diagnostics.record(node, "fallout_id", fallout_id);
        state.diagnostics.record(node, "prior_steps", history.len());
        state.diagnostics.record(node, "rationale", rationale);

        state.transition(&ResolutionEvent::Suspend)?;
        state.next_target = NodeTarget::HumanResume;
        state.escalation_cause = Some(cause);

        info!(fallout_id, "Traversal suspended awaiting human decision");

        Ok(PausedTraversal {
            marker: ResumeMarker {
                order_id: state.order_id.clone(),
                traversal_id: state.traversal_id,
                fallout_id,
                summary: format!("{}\n{detail}", snapshot.describe()),
                paused_at: Utc::now(),
            },
            state,
        })
    }

    fn validate(paused: &PausedTraversal) -> Result<()> {
        let PausedTraversal { marker, state } = paused;
        if !state.is_suspended() {
            return Err(FalloutError::InvalidResume(format!(
                "traversal {} is {} at {}, not waiting for a decision",
                state.traversal_id,
                state.resolution_status(),
                state.next_target
            )));
        }
        if marker.order_id != state.order_id || marker.traversal_id != state.traversal_id {
            return Err(FalloutError::InvalidResume(format!(
                "marker for order {} does not belong to traversal of order {}",
                marker.order_id, state.order_id
            )));
        }
        Ok(())
    }

    /// Phase 2: consume one decision and finish the traversal.
    ///
    /// `approve` resolves, everything else leaves the order escalated.
    ///
    /// The paused traversal is consumed even when writing the decision step
    /// fails. Callers keep their serialized copy until this returns `Ok` and
    /// retry from it after a `Persistence` error.
    #[instrument(skip(self, paused, decision), fields(order_id = %paused.marker.order_id, fallout_id = paused.marker.fallout_id))]
    pub async fn resume(&self, paused: PausedTraversal, decision: &str) -> Result<WorkflowState> {
        Self::validate(&paused)?;
        let node = NodeTarget::HumanResume;
        let PausedTraversal { marker, mut state } = paused;
        state.enter(node)?;

        let outcome = DecisionOutcome::from_input(decision);
        let status = outcome.final_status();

        self.store
            .record_step(
                marker.fallout_id,
                NewResolutionStep::new(
                    actors::HUMAN_AGENT,
                    step_actions::HUMAN_DECISION,
                    format!("decision={decision:?}; outcome={status}"),
                ),
            )
            .await?;
        log_audit_operation(
            "human_decision",
            &state.order_id,
            Some(marker.fallout_id),
            actors::HUMAN_AGENT,
            None,
        );

        state.record_action(decision);
        if let DecisionOutcome::Unrecognized(raw) = &outcome {
            state.record_action(format!(
                "unrecognized decision input {raw:?}; order remains escalated"
            ));
        }
        state.diagnostics.record(node, "decision", decision);
        state.diagnostics.record(node, "outcome", status.to_string());

        state.transition(&outcome.event())?;
        state.next_target = NodeTarget::Completed;

        info!(status = %status, "Traversal resumed and completed");
        Ok(state)
    }
}
