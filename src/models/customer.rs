//! # Customer Model
//!
//! Reference data joined into order snapshots. The workflow only reads it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub customer_id: String,
    pub name: String,
    pub account_tier: String,
    /// Lower is more urgent
    pub priority_level: i32,
    pub created_at: DateTime<Utc>,
}

/// New Customer for intake
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCustomer {
    pub customer_id: String,
    pub name: String,
    pub account_tier: String,
    pub priority_level: i32,
}

impl NewCustomer {
    pub fn into_customer(self, now: DateTime<Utc>) -> Customer {
        Customer {
            customer_id: self.customer_id,
            name: self.name,
            account_tier: self.account_tier,
            priority_level: self.priority_level,
            created_at: now,
        }
    }
}
