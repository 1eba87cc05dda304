//! # Classifier
//!
//! The routing oracle. Given an [`OrderSnapshot`] it returns a routing label,
//! and for escalations a free-text rationale. Implementations may call a
//! model, a rules engine or a person; they only ever see read-only snapshots
//! and history, never a store handle.
//!
//! Raw labels are normalized by [`parse_label`]: anything outside
//! `{resubmission, esim, switch, human}` becomes [`RoutingLabel::Human`] and
//! the raw text is kept so the anomaly can be recorded.

pub mod rules;

pub use rules::RuleBasedClassifier;

use crate::models::{OrderSnapshot, ResolutionHistory};
use crate::state_machine::NodeTarget;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

#[async_trait]
pub trait Classifier: Send + Sync {
    /// Raw routing label for an order
    async fn classify(&self, snapshot: &OrderSnapshot) -> anyhow::Result<String>;

    /// Free-text rationale for sending an order to a human
    async fn explain(
        &self,
        snapshot: &OrderSnapshot,
        history: &ResolutionHistory,
    ) -> anyhow::Result<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoutingLabel {
    Resubmission,
    Esim,
    Switch,
    Human,
}

impl RoutingLabel {
    pub const ALL: [RoutingLabel; 4] = [
        RoutingLabel::Resubmission,
        RoutingLabel::Esim,
        RoutingLabel::Switch,
        RoutingLabel::Human,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Resubmission => "resubmission",
            Self::Esim => "esim",
            Self::Switch => "switch",
            Self::Human => "human",
        }
    }

    /// The single node a label routes to
    pub fn target(&self) -> NodeTarget {
        match self {
            Self::Resubmission => NodeTarget::Resubmission,
            Self::Esim => NodeTarget::Esim,
            Self::Switch => NodeTarget::Switch,
            Self::Human => NodeTarget::HumanEscalate,
        }
    }
}

impl fmt::Display for RoutingLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalize raw classifier output.
///
/// Returns the label and, when the output was outside the label set, the
/// raw text that was mapped to `human`.
pub fn parse_label(raw: &str) -> (RoutingLabel, Option<String>) {
    let normalized = raw.trim().to_lowercase();
    let label = RoutingLabel::ALL
        .into_iter()
        .find(|label| label.as_str() == normalized);

    match label {
        Some(label) => (label, None),
        None => (RoutingLabel::Human, Some(raw.to_string())),
    }
}
