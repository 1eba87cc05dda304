//! # Resolution Step Model
//!
//! Atomic actions inside a fallout attempt, and the joined history view the
//! escalation path reads back.

use super::fallout::FalloutStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionStep {
    pub step_id: i64,
    pub fallout_id: i64,
    pub actor: String,
    pub action: String,
    pub result: String,
    pub created_at: DateTime<Utc>,
}

/// New ResolutionStep; the owning fallout is supplied by the store call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewResolutionStep {
    pub actor: String,
    pub action: String,
    pub result: String,
}

impl NewResolutionStep {
    pub fn new(
        actor: impl Into<String>,
        action: impl Into<String>,
        result: impl Into<String>,
    ) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
            result: result.into(),
        }
    }

    pub fn into_step(self, step_id: i64, fallout_id: i64, now: DateTime<Utc>) -> ResolutionStep {
        ResolutionStep {
            step_id,
            fallout_id,
            actor: self.actor,
            action: self.action,
            result: self.result,
            created_at: now,
        }
    }
}

/// One (fallout, step) joined row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionHistoryEntry {
    pub fallout_id: i64,
    pub order_id: String,
    pub resolution_kind: String,
    pub fallout_status: FalloutStatus,
    pub detail: String,
    pub step_id: i64,
    pub actor: String,
    pub action: String,
    pub result: String,
    pub step_created_at: DateTime<Utc>,
}

/// Resolution history of an order, ascending by step timestamp
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionHistory {
    pub entries: Vec<ResolutionHistoryEntry>,
}

impl ResolutionHistory {
    pub fn new(mut entries: Vec<ResolutionHistoryEntry>) -> Self {
        entries.sort_by(|a, b| {
            a.step_created_at
                .cmp(&b.step_created_at)
                .then(a.step_id.cmp(&b.step_id))
        });
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Distinct fallout ids in first-seen order
    pub fn fallout_ids(&self) -> Vec<i64> {
        let mut ids: Vec<i64> = Vec::new();
        for entry in &self.entries {
            if !ids.contains(&entry.fallout_id) {
                ids.push(entry.fallout_id);
            }
        }
        ids
    }

    pub fn steps_for(&self, fallout_id: i64) -> impl Iterator<Item = &ResolutionHistoryEntry> {
        self.entries
            .iter()
            .filter(move |entry| entry.fallout_id == fallout_id)
    }

    /// One line per step, oldest first
    pub fn summary_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| {
                format!(
                    "[{}] {} {} ({}): {} -> {}",
                    e.step_created_at.to_rfc3339(),
                    e.resolution_kind,
                    e.fallout_status,
                    e.actor,
                    e.action,
                    e.result
                )
            })
            .collect()
    }
}
