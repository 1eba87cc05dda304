//! Append-only diagnostic log.
//!
//! Each visited node writes entries under its own node name, so two nodes
//! writing the same key never overwrite one another.

use crate::state_machine::NodeTarget;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticEntry {
    pub node: NodeTarget,
    pub key: String,
    pub value: serde_json::Value,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticLog {
    entries: Vec<DiagnosticEntry>,
}

impl DiagnosticLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(
        &mut self,
        node: NodeTarget,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) {
        self.entries.push(DiagnosticEntry {
            node,
            key: key.into(),
            value: value.into(),
            recorded_at: Utc::now(),
        });
    }

    pub fn entries(&self) -> &[DiagnosticEntry] {
        &self.entries
    }

    pub fn for_node(&self, node: NodeTarget) -> impl Iterator<Item = &DiagnosticEntry> {
        self.entries.iter().filter(move |entry| entry.node == node)
    }

    /// Most recent value a node wrote under `key`
    pub fn latest(&self, node: NodeTarget, key: &str) -> Option<&serde_json::Value> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.node == node && entry.key == key)
            .map(|entry| &entry.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
