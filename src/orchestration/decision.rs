use async_trait::async_trait;

/// Where a human decision comes from: a review queue, a chat prompt, a test script.
///
/// The engine calls it at most once per suspended traversal.
#[async_trait]
pub trait HumanDecisionSource: Send + Sync {
    async fn obtain_decision(&self, order_id: &str, summary: &str) -> anyhow::Result<String>;
}

/// Always answers with the same token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixedDecision(pub String);

impl FixedDecision {
    pub fn new(decision: impl Into<String>) -> Self {
        Self(decision.into())
    }
}

#[async_trait]
impl HumanDecisionSource for FixedDecision {
    async fn obtain_decision(&self, _order_id: &str, _summary: &str) -> anyhow::Result<String> {
        Ok(self.0.clone())
    }
}
