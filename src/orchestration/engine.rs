//! # Workflow Engine
//!
//! Drives one traversal per call through the routing graph:
//!
//! ```text
//! master -> {resubmission | esim | switch | human_escalate} -> [human_resume] -> completed
//! ```
//!
//! ## Failure Model
//!
//! - Unknown order or customer: `NotFound` before anything is written
//! - Classifier error, panic or unknown label: routed to `human_escalate`
//! - Specialist error or panic: converted into an escalation whose rationale
//!   is the fault description
//! - Failure to write the escalation or the decision step: `Persistence`
//!
//! A specialist runs at most once per traversal and there is no retry loop.

use super::decision::HumanDecisionSource;
use crate::classifier::{parse_label, Classifier, RoutingLabel};
use crate::config::EngineConfig;
use crate::context::OrderContextProvider;
use crate::error::{FalloutError, Result};
use crate::handlers::specialist::as_handler_fault;
use crate::handlers::{
    panic_message, EscalationGate, NodeHandler, RemediationHandler, RemediationPlan,
};
use crate::logging::{log_error, log_workflow_operation};
use crate::models::OrderSnapshot;
use crate::state_machine::{NodeTarget, ResolutionEvent};
use crate::store::AuditStore;
use crate::workflow::{EscalationCause, PausedTraversal, TraversalOutcome, WorkflowState};
use futures::FutureExt;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

pub struct WorkflowEngine {
    classifier: Arc<dyn Classifier>,
    context: OrderContextProvider,
    specialists: HashMap<NodeTarget, Arc<dyn NodeHandler>>,
    gate: EscalationGate,
    config: EngineConfig,
}

impl std::fmt::Debug for WorkflowEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkflowEngine")
            .field("specialists", &self.specialists.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl WorkflowEngine {
    /// Engine with the three built-in specialists
    pub fn new(
        store: Arc<dyn AuditStore>,
        classifier: Arc<dyn Classifier>,
        config: EngineConfig,
    ) -> Self {
        let mut specialists: HashMap<NodeTarget, Arc<dyn NodeHandler>> = HashMap::new();
        for plan in [
            RemediationPlan::resubmission(),
            RemediationPlan::esim(),
            RemediationPlan::switch(),
        ] {
            specialists.insert(
                plan.node,
                Arc::new(RemediationHandler::new(plan, store.clone())),
            );
        }

        Self {
            context: OrderContextProvider::new(store.clone()),
            gate: EscalationGate::new(store, classifier.clone(), config.rationale_max_chars),
            classifier,
            specialists,
            config,
        }
    }

    /// Replace the handler for one specialist node
    pub fn with_handler(mut self, handler: Arc<dyn NodeHandler>) -> Result<Self> {
        let node = handler.node();
        if !node.is_specialist() {
            return Err(FalloutError::Configuration(format!(
                "{node} is not a specialist node"
            )));
        }
        self.specialists.insert(node, handler);
        Ok(self)
    }

    pub fn context(&self) -> &OrderContextProvider {
        &self.context
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Start a traversal at the routing node.
    ///
    /// Returns `Completed` for specialist paths and `Suspended` when the order
    /// reached the escalation gate.
    #[instrument(skip(self))]
    pub async fn start(&self, order_id: &str) -> Result<TraversalOutcome> {
        let mut state = WorkflowState::new(order_id);
        log_workflow_operation("start", order_id, None, "pending", None);

        let snapshot = match self.context.get_order_details(order_id).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                log_error("workflow_engine", "start", &e.to_string(), Some(order_id));
                return Err(e);
            }
        };

        self.route(&mut state, &snapshot).await?;

        if state.next_target.is_specialist() {
            state = self.run_specialist(state).await?;
            if state.is_terminal() {
                log_workflow_operation(
                    "complete",
                    order_id,
                    Some(NodeTarget::Completed.as_str()),
                    &state.resolution_status().to_string(),
                    None,
                );
                return Ok(TraversalOutcome::Completed(state));
            }
        }

        self.escalate(state).await.map(TraversalOutcome::Suspended)
    }

    /// Resume a suspended traversal with one human decision.
    ///
    /// On `Err` nothing was recorded; resume again from the caller's
    /// serialized [`PausedTraversal`].
    #[instrument(skip(self, paused, decision), fields(order_id = %paused.marker.order_id))]
    pub async fn resume(&self, paused: PausedTraversal, decision: &str) -> Result<WorkflowState> {
        let order_id = paused.marker.order_id.clone();
        let state = self.gate.resume(paused, decision).await?;
        log_workflow_operation(
            "resume",
            &order_id,
            Some(NodeTarget::HumanResume.as_str()),
            &state.resolution_status().to_string(),
            Some(decision),
        );
        Ok(state)
    }

    /// Start a traversal and, if it suspends, resume it once with a decision
    /// obtained from `source`.
    ///
    /// A decision source that fails is treated as an unrecognized answer, so
    /// the order still finishes as escalated.
    pub async fn run_to_completion(
        &self,
        order_id: &str,
        source: &dyn HumanDecisionSource,
    ) -> Result<WorkflowState> {
        let paused = match self.start(order_id).await? {
            TraversalOutcome::Completed(state) => return Ok(state),
            TraversalOutcome::Suspended(paused) => paused,
        };

        let decision = match source
            .obtain_decision(&paused.marker.order_id, &paused.marker.summary)
            .await
        {
            Ok(decision) => decision,
            Err(e) => {
                log_error(
                    "workflow_engine",
                    "obtain_decision",
                    &e.to_string(),
                    Some(order_id),
                );
                format!("<decision unavailable: {e}>")
            }
        };
        self.resume(paused, &decision).await
    }

    async fn route(&self, state: &mut WorkflowState, snapshot: &OrderSnapshot) -> Result<()> {
        let node = NodeTarget::Master;
        state.enter(node)?;

        let classified = AssertUnwindSafe(self.classifier.classify(snapshot))
            .catch_unwind()
            .await;

        let label = match classified {
            Ok(Ok(raw)) => {
                state.diagnostics.record(node, "raw_label", raw.as_str());
                let (label, anomaly) = parse_label(&raw);
                if let Some(raw) = anomaly {
                    warn!(raw_label = %raw, "Classifier returned a label outside the known set");
                    state.escalation_cause = Some(EscalationCause::UnrecognizedLabel(raw));
                } else if label == RoutingLabel::Human {
                    state.escalation_cause = Some(EscalationCause::Classified);
                }
                label
            }
            Ok(Err(e)) => {
                warn!(error = %e, "Classifier failed, routing to human");
                state.escalation_cause = Some(EscalationCause::ClassifierError(e.to_string()));
                RoutingLabel::Human
            }
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                warn!(reason = %reason, "Classifier panicked, routing to human");
                state.escalation_cause = Some(EscalationCause::ClassifierError(reason));
                RoutingLabel::Human
            }
        };

        state.transition(&ResolutionEvent::Route)?;
        state.next_target = label.target();
        state.diagnostics.record(node, "label", label.as_str());
        state.record_action(format!(
            "Routed order {} to {}",
            state.order_id, state.next_target
        ));
        log_workflow_operation(
            "route",
            &state.order_id,
            Some(node.as_str()),
            &state.resolution_status().to_string(),
            Some(label.as_str()),
        );
        Ok(())
    }

    async fn run_specialist(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let node = state.next_target;
        let handler = self.specialists.get(&node).cloned().ok_or_else(|| {
            FalloutError::Configuration(format!("no handler registered for {node}"))
        })?;
        state.enter(node)?;
        let checkpoint = state.clone();

        debug!(node = %node, "Invoking specialist handler");
        let outcome = AssertUnwindSafe(handler.handle(state)).catch_unwind().await;

        let fault = match outcome {
            Ok(Ok(state)) if state.is_terminal() => {
                log_workflow_operation(
                    "handle",
                    &state.order_id,
                    Some(node.as_str()),
                    &state.resolution_status().to_string(),
                    state.actions_taken().last().map(String::as_str),
                );
                return Ok(state);
            }
            Ok(Ok(state)) => FalloutError::handler_fault(
                handler.actor(),
                format!(
                    "handler returned without finishing (status {}, next {})",
                    state.resolution_status(),
                    state.next_target
                ),
            ),
            Ok(Err(e)) => as_handler_fault(handler.actor(), e),
            Err(payload) => FalloutError::handler_fault(
                handler.actor(),
                format!("panicked: {}", panic_message(payload.as_ref())),
            ),
        };

        Ok(self.divert_to_escalation(checkpoint, node, fault))
    }

    /// Continue from the pre-handler state with the fault as escalation cause
    fn divert_to_escalation(
        &self,
        mut state: WorkflowState,
        node: NodeTarget,
        fault: FalloutError,
    ) -> WorkflowState {
        log_error(
            "workflow_engine",
            node.as_str(),
            &fault.to_string(),
            Some(&state.order_id),
        );
        let (handler, reason) = match fault {
            FalloutError::HandlerFault { handler, reason } => (handler, reason),
            other => (node.to_string(), other.to_string()),
        };

        state.diagnostics.record(node, "fault", reason.as_str());
        state.record_action(format!(
            "Handler fault in {handler}: {reason}; escalating to human review"
        ));
        state.escalation_cause = Some(EscalationCause::HandlerFault { handler, reason });
        state.next_target = NodeTarget::HumanEscalate;
        state
    }

    async fn escalate(&self, mut state: WorkflowState) -> Result<PausedTraversal> {
        state.enter(NodeTarget::HumanEscalate)?;
        let paused = self.gate.escalate(state).await?;
        info!(
            order_id = %paused.marker.order_id,
            fallout_id = paused.marker.fallout_id,
            "Traversal suspended at escalation gate"
        );
        log_workflow_operation(
            "suspend",
            &paused.marker.order_id,
            Some(NodeTarget::HumanEscalate.as_str()),
            &paused.state.resolution_status().to_string(),
            None,
        );
        Ok(paused)
    }
}
