//! # Order Context Provider
//!
//! Read-side query surface over the audit store. Every method is a pure read:
//! safe to call repeatedly and from concurrent traversals.

use crate::error::{FalloutError, Result};
use crate::models::{Order, OrderSnapshot, ResolutionHistory};
use crate::store::AuditStore;
use std::sync::Arc;
use tracing::debug;

#[derive(Clone)]
pub struct OrderContextProvider {
    store: Arc<dyn AuditStore>,
}

impl std::fmt::Debug for OrderContextProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OrderContextProvider").finish_non_exhaustive()
    }
}

impl OrderContextProvider {
    pub fn new(store: Arc<dyn AuditStore>) -> Self {
        Self { store }
    }

    /// Order joined with its customer.
    ///
    /// Fails with `NotFound` when either the order or its customer is unknown.
    pub async fn get_order_details(&self, order_id: &str) -> Result<OrderSnapshot> {
        let order = self.store.get_order(order_id).await?;
        let customer = match self.store.get_customer(&order.customer_id).await {
            Ok(customer) => customer,
            Err(FalloutError::NotFound { .. }) => {
                return Err(FalloutError::customer_not_found(&order.customer_id))
            }
            Err(e) => return Err(e),
        };
        debug!(order_id, customer_id = %customer.customer_id, "Loaded order snapshot");
        Ok(OrderSnapshot { order, customer })
    }

    pub async fn resolution_history(&self, order_id: &str) -> Result<ResolutionHistory> {
        self.store.get_resolution_history(order_id).await
    }

    /// Orders with at least one faulty sub-status, oldest first
    pub async fn failed_orders(&self, limit: i64) -> Result<Vec<Order>> {
        self.store.list_fallout_candidates(limit).await
    }
}
