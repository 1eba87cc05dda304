//! Test doubles for the classifier, specialist handlers and human decisions

use anyhow::anyhow;
use async_trait::async_trait;
use fallout_core::handlers::NodeHandler;
use fallout_core::models::{OrderSnapshot, ResolutionHistory};
use fallout_core::orchestration::HumanDecisionSource;
use fallout_core::workflow::WorkflowState;
use fallout_core::{Classifier, FalloutError, NodeTarget};
use parking_lot::Mutex;
use std::collections::HashMap;

/// Classifier answering from a fixed table, `fallback` for anything else
#[derive(Debug, Default)]
pub struct ScriptedClassifier {
    labels: HashMap<String, String>,
    fallback: String,
    rationale: Option<String>,
    fail_explain: bool,
    panic_explain: bool,
}

impl ScriptedClassifier {
    pub fn always(label: &str) -> Self {
        Self {
            fallback: label.to_string(),
            ..Self::default()
        }
    }

    pub fn with_label(mut self, order_id: &str, label: &str) -> Self {
        self.labels.insert(order_id.to_string(), label.to_string());
        self
    }

    pub fn with_rationale(mut self, rationale: impl Into<String>) -> Self {
        self.rationale = Some(rationale.into());
        self
    }

    pub fn failing_explain(mut self) -> Self {
        self.fail_explain = true;
        self
    }

    pub fn panicking_explain(mut self) -> Self {
        self.panic_explain = true;
        self
    }
}

#[async_trait]
impl Classifier for ScriptedClassifier {
    async fn classify(&self, snapshot: &OrderSnapshot) -> anyhow::Result<String> {
        Ok(self
            .labels
            .get(snapshot.order_id())
            .cloned()
            .unwrap_or_else(|| self.fallback.clone()))
    }

    async fn explain(
        &self,
        snapshot: &OrderSnapshot,
        history: &ResolutionHistory,
    ) -> anyhow::Result<String> {
        if self.panic_explain {
            panic!("reasoning service crashed");
        }
        if self.fail_explain {
            return Err(anyhow!("reasoning service unavailable"));
        }
        Ok(self.rationale.clone().unwrap_or_else(|| {
            format!(
                "scripted rationale for {} with {} prior steps",
                snapshot.order_id(),
                history.len()
            )
        }))
    }
}

/// Classifier whose classify call always errors
#[derive(Debug, Default)]
pub struct FailingClassifier;

#[async_trait]
impl Classifier for FailingClassifier {
    async fn classify(&self, _snapshot: &OrderSnapshot) -> anyhow::Result<String> {
        Err(anyhow!("model endpoint timed out"))
    }

    async fn explain(
        &self,
        _snapshot: &OrderSnapshot,
        _history: &ResolutionHistory,
    ) -> anyhow::Result<String> {
        Ok("classifier unavailable".to_string())
    }
}

/// How a [`FaultyHandler`] misbehaves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultMode {
    Error,
    Panic,
    Unfinished,
}

/// Specialist stand-in that never finishes properly
#[derive(Debug)]
pub struct FaultyHandler {
    pub node: NodeTarget,
    pub mode: FaultMode,
}

#[async_trait]
impl NodeHandler for FaultyHandler {
    fn node(&self) -> NodeTarget {
        self.node
    }

    fn actor(&self) -> &'static str {
        "faulty_agent"
    }

    async fn handle(&self, mut state: WorkflowState) -> fallout_core::Result<WorkflowState> {
        state.record_action("faulty handler started");
        match self.mode {
            FaultMode::Error => Err(FalloutError::Persistence(
                "provisioning API returned 503".to_string(),
            )),
            FaultMode::Panic => panic!("provisioning client crashed"),
            FaultMode::Unfinished => Ok(state),
        }
    }
}

/// Decision source that answers from a queue and records what it was shown
#[derive(Debug, Default)]
pub struct ScriptedDecisions {
    answers: Mutex<Vec<String>>,
    pub presented: Mutex<Vec<(String, String)>>,
    fail: bool,
}

impl ScriptedDecisions {
    pub fn answering(answer: &str) -> Self {
        Self {
            answers: Mutex::new(vec![answer.to_string()]),
            ..Self::default()
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.presented.lock().len()
    }
}

#[async_trait]
impl HumanDecisionSource for ScriptedDecisions {
    async fn obtain_decision(&self, order_id: &str, summary: &str) -> anyhow::Result<String> {
        self.presented
            .lock()
            .push((order_id.to_string(), summary.to_string()));
        if self.fail {
            return Err(anyhow!("review queue offline"));
        }
        self.answers
            .lock()
            .pop()
            .ok_or_else(|| anyhow!("no scripted answer left"))
    }
}
