use super::{Classifier, RoutingLabel};
use crate::models::{ActivationStatus, EsimStatus, OrderSnapshot, ResolutionHistory, SwitchStatus};
use async_trait::async_trait;

/// Deterministic classifier over the three sub-status triggers.
///
/// Priority when several hold at once: switch, then eSIM, then activation.
/// Orders matching no trigger go to a human.
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleBasedClassifier;

impl RuleBasedClassifier {
    pub fn new() -> Self {
        Self
    }

    pub fn label_for(&self, snapshot: &OrderSnapshot) -> RoutingLabel {
        let order = &snapshot.order;
        if order.switch_status == SwitchStatus::Error {
            RoutingLabel::Switch
        } else if order.esim_status == EsimStatus::Failed {
            RoutingLabel::Esim
        } else if order.activation_status == ActivationStatus::NotSent {
            RoutingLabel::Resubmission
        } else {
            RoutingLabel::Human
        }
    }
}

#[async_trait]
impl Classifier for RuleBasedClassifier {
    async fn classify(&self, snapshot: &OrderSnapshot) -> anyhow::Result<String> {
        Ok(self.label_for(snapshot).as_str().to_string())
    }

    async fn explain(
        &self,
        snapshot: &OrderSnapshot,
        history: &ResolutionHistory,
    ) -> anyhow::Result<String> {
        let faulty: Vec<String> = snapshot
            .order
            .faulty_fields()
            .iter()
            .map(|field| field.to_string())
            .collect();

        let condition = if faulty.is_empty() {
            "no automated remediation trigger matches".to_string()
        } else {
            format!("faulty sub-statuses: {}", faulty.join(", "))
        };

        let mut rationale = format!(
            "Manual review required for {}; {condition}; {} prior resolution step(s)",
            snapshot.describe(),
            history.len()
        );
        for line in history.summary_lines() {
            rationale.push_str("\n  ");
            rationale.push_str(&line);
        }
        Ok(rationale)
    }
}
