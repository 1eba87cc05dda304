use super::{Customer, Order};
use serde::{Deserialize, Serialize};

/// Read-only view of an order joined with its customer.
///
/// This is everything a [`crate::classifier::Classifier`] gets to see; it
/// carries no store handle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderSnapshot {
    pub order: Order,
    pub customer: Customer,
}

impl OrderSnapshot {
    pub fn order_id(&self) -> &str {
        &self.order.order_id
    }

    /// Compact description used in prompts, rationales and decision summaries
    pub fn describe(&self) -> String {
        format!(
            "order {} ({}) for {} [{} tier, priority {}]: activation={}, esim={}, switch={}, issue_type={}",
            self.order.order_id,
            self.order.product_category,
            self.customer.name,
            self.customer.account_tier,
            self.customer.priority_level,
            self.order.activation_status,
            self.order.esim_status,
            self.order.switch_status,
            self.order.issue_type.as_deref().unwrap_or("unclassified"),
        )
    }
}
