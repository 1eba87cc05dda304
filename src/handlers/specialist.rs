use super::NodeHandler;
use crate::constants::{actors, resolution_kinds, step_actions};
use crate::context::OrderContextProvider;
use crate::error::{FalloutError, Result};
use crate::logging::log_audit_operation;
use crate::models::{
    ActivationStatus, EsimStatus, NewFallout, NewResolutionStep, SubStatusChange, SubStatusField,
    SwitchStatus,
};
use crate::state_machine::{NodeTarget, ResolutionEvent};
use crate::store::AuditStore;
use crate::workflow::WorkflowState;
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// What one specialist owns and how it remediates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemediationPlan {
    pub node: NodeTarget,
    pub actor: &'static str,
    pub resolution_kind: &'static str,
    pub action: &'static str,
    pub field: SubStatusField,
    /// Value that triggers remediation
    pub trigger: &'static str,
    /// Value written by the remediation
    pub remediated: &'static str,
    /// Human-readable verb for actions_taken
    pub verb: &'static str,
}

impl RemediationPlan {
    /// activation `not_sent` -> `pending`
    pub fn resubmission() -> Self {
        Self {
            node: NodeTarget::Resubmission,
            actor: actors::RESUBMISSION_AGENT,
            resolution_kind: resolution_kinds::ACTIVATION_RESUBMISSION,
            action: step_actions::RESUBMIT_ACTIVATION,
            field: SubStatusField::Activation,
            trigger: ActivationStatus::NotSent.as_str(),
            remediated: ActivationStatus::Pending.as_str(),
            verb: "Resubmitted activation",
        }
    }

    /// eSIM `failed` -> `reprovisioned`
    pub fn esim() -> Self {
        Self {
            node: NodeTarget::Esim,
            actor: actors::ESIM_AGENT,
            resolution_kind: resolution_kinds::ESIM_REPROVISION,
            action: step_actions::REPROVISION_ESIM,
            field: SubStatusField::Esim,
            trigger: EsimStatus::Failed.as_str(),
            remediated: EsimStatus::Reprovisioned.as_str(),
            verb: "Reprovisioned eSIM",
        }
    }

    /// switch `error` -> `reconfigured`
    pub fn switch() -> Self {
        Self {
            node: NodeTarget::Switch,
            actor: actors::SWITCH_AGENT,
            resolution_kind: resolution_kinds::SWITCH_RECONFIGURATION,
            action: step_actions::RECONFIGURE_SWITCH,
            field: SubStatusField::Switch,
            trigger: SwitchStatus::Error.as_str(),
            remediated: SwitchStatus::Reconfigured.as_str(),
            verb: "Reconfigured switch",
        }
    }

    pub fn for_node(node: NodeTarget) -> Option<Self> {
        match node {
            NodeTarget::Resubmission => Some(Self::resubmission()),
            NodeTarget::Esim => Some(Self::esim()),
            NodeTarget::Switch => Some(Self::switch()),
            _ => None,
        }
    }

    fn change(&self) -> SubStatusChange {
        SubStatusChange {
            field: self.field,
            expected: self.trigger.to_string(),
            new_value: self.remediated.to_string(),
        }
    }

    fn transition_text(&self) -> String {
        format!("{}: {} -> {}", self.field, self.trigger, self.remediated)
    }
}

/// Specialist handler driven by a [`RemediationPlan`]
pub struct RemediationHandler {
    plan: RemediationPlan,
    context: OrderContextProvider,
    store: Arc<dyn AuditStore>,
}

impl std::fmt::Debug for RemediationHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemediationHandler")
            .field("plan", &self.plan)
            .finish_non_exhaustive()
    }
}

impl RemediationHandler {
    pub fn new(plan: RemediationPlan, store: Arc<dyn AuditStore>) -> Self {
        Self {
            plan,
            context: OrderContextProvider::new(store.clone()),
            store,
        }
    }

    pub fn plan(&self) -> &RemediationPlan {
        &self.plan
    }

    async fn remediate(&self, order_id: &str) -> Result<Option<i64>> {
        let transition = self.plan.transition_text();
        let fallout = NewFallout::completed(
            order_id,
            self.plan.actor,
            self.plan.resolution_kind,
            format!("{} for order {order_id} ({transition})", self.plan.verb),
        );
        let step = NewResolutionStep::new(self.plan.actor, self.plan.action, transition);

        let fallout_id = self
            .store
            .update_order_sub_status(order_id, self.plan.change(), fallout, step)
            .await?;

        if let Some(id) = fallout_id {
            log_audit_operation(
                "remediate",
                order_id,
                Some(id),
                self.plan.actor,
                Some(self.plan.resolution_kind),
            );
        }
        Ok(fallout_id)
    }

    fn no_action(&self, state: &mut WorkflowState, observed: &str, reason: &str) {
        let node = self.plan.node;
        state.record_action(format!(
            "No action needed for order {}: {} is {observed} ({reason})",
            state.order_id, self.plan.field
        ));
        state.diagnostics.record(node, "outcome", "no_action");
        state.diagnostics.record(node, "observed", observed);
    }
}

#[async_trait]
impl NodeHandler for RemediationHandler {
    fn node(&self) -> NodeTarget {
        self.plan.node
    }

    fn actor(&self) -> &'static str {
        self.plan.actor
    }

    #[instrument(skip(self, state), fields(node = %self.plan.node, order_id = %state.order_id))]
    async fn handle(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let node = self.plan.node;
        let snapshot = self.context.get_order_details(&state.order_id).await?;
        let observed = snapshot.order.sub_status(self.plan.field);

        if observed == self.plan.trigger {
            match self.remediate(&state.order_id).await? {
                Some(fallout_id) => {
                    info!(fallout_id, "Remediation applied");
                    state.record_action(format!(
                        "{} for order {} ({})",
                        self.plan.verb,
                        state.order_id,
                        self.plan.transition_text()
                    ));
                    state.diagnostics.record(node, "outcome", "remediated");
                    state.diagnostics.record(node, "fallout_id", fallout_id);
                    state.diagnostics.record(
                        node,
                        "transition",
                        json!({ "from": self.plan.trigger, "to": self.plan.remediated }),
                    );
                }
                None => {
                    debug!("Sub-status changed before the update applied");
                    self.no_action(&mut state, observed, "changed concurrently before update");
                }
            }
        } else {
            self.no_action(&mut state, observed, "trigger condition does not hold");
        }

        state.transition(&ResolutionEvent::Resolve)?;
        state.next_target = NodeTarget::Completed;
        Ok(state)
    }
}

/// Convert any specialist error into the fault an escalation carries
pub(crate) fn as_handler_fault(actor: &str, err: FalloutError) -> FalloutError {
    match err {
        fault @ FalloutError::HandlerFault { .. } => fault,
        other => FalloutError::handler_fault(actor, other.to_string()),
    }
}
