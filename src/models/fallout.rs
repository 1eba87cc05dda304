//! # Fallout Model
//!
//! One remediation attempt against one order.
//!
//! ## Audit Guarantees
//!
//! - **Append-only**: fallouts are never updated or deleted; a later attempt on
//!   the same order is a new row
//! - **Never bare**: a fallout is always written in the same transaction as its
//!   originating [`crate::models::ResolutionStep`]
//! - **Owned by the order**: `order_id` references `orders(order_id)`

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FalloutStatus {
    Pending,
    Completed,
    Escalated,
}

impl FalloutStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Escalated => "escalated",
        }
    }
}

impl fmt::Display for FalloutStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FalloutStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "escalated" => Ok(Self::Escalated),
            _ => Err(format!("Invalid fallout status: {s}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FalloutRecord {
    pub fallout_id: i64,
    pub order_id: String,
    /// Handler that acted
    pub actor: String,
    pub resolution_kind: String,
    pub detail: String,
    pub status: FalloutStatus,
    pub created_at: DateTime<Utc>,
}

/// New FalloutRecord for creation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewFallout {
    pub order_id: String,
    pub actor: String,
    pub resolution_kind: String,
    pub detail: String,
    pub status: FalloutStatus,
}

impl NewFallout {
    pub fn completed(
        order_id: impl Into<String>,
        actor: impl Into<String>,
        resolution_kind: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            actor: actor.into(),
            resolution_kind: resolution_kind.into(),
            detail: detail.into(),
            status: FalloutStatus::Completed,
        }
    }

    pub fn escalated(
        order_id: impl Into<String>,
        actor: impl Into<String>,
        resolution_kind: impl Into<String>,
        detail: impl Into<String>,
    ) -> Self {
        Self {
            order_id: order_id.into(),
            actor: actor.into(),
            resolution_kind: resolution_kind.into(),
            detail: detail.into(),
            status: FalloutStatus::Escalated,
        }
    }

    pub fn into_record(self, fallout_id: i64, now: DateTime<Utc>) -> FalloutRecord {
        FalloutRecord {
            fallout_id,
            order_id: self.order_id,
            actor: self.actor,
            resolution_kind: self.resolution_kind,
            detail: self.detail,
            status: self.status,
            created_at: now,
        }
    }
}
