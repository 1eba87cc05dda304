//! In-process audit store.
//!
//! Orders live in a `DashMap`, so holding an order entry's write guard
//! serializes writes per order. The append-only audit tables sit behind one
//! `parking_lot` mutex. Lock order is always order entry, then audit tables.

use super::AuditStore;
use crate::constants::step_actions;
use crate::error::{FalloutError, Result};
use crate::models::{
    Customer, FalloutRecord, FalloutStatus, NewCustomer, NewFallout, NewOrder, NewResolutionStep, Order,
    ResolutionHistory, ResolutionHistoryEntry, ResolutionStep, SubStatusChange,
};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

#[derive(Debug, Default)]
struct AuditTables {
    fallouts: Vec<FalloutRecord>,
    steps: Vec<ResolutionStep>,
    next_fallout_id: i64,
    next_step_id: i64,
}

impl AuditTables {
    fn fallout_exists(&self, fallout_id: i64) -> bool {
        self.fallouts.iter().any(|f| f.fallout_id == fallout_id)
    }

    /// Latest fallout is an escalation nobody has decided on yet
    fn awaiting_decision(&self, order_id: &str) -> bool {
        let latest = self
            .fallouts
            .iter()
            .filter(|f| f.order_id == order_id)
            .max_by_key(|f| f.fallout_id);
        match latest {
            Some(f) if f.status == FalloutStatus::Escalated => !self
                .steps
                .iter()
                .any(|s| s.fallout_id == f.fallout_id && s.action == step_actions::HUMAN_DECISION),
            _ => false,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryAuditStore {
    customers: DashMap<String, Customer>,
    orders: DashMap<String, Order>,
    audit: Mutex<AuditTables>,
    fail_next_write: AtomicBool,
}

impl InMemoryAuditStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next multi-row write fail after its first row is staged.
    ///
    /// Used to exercise the rollback contract: the failing call returns
    /// `FalloutError::Persistence` and leaves no rows behind.
    pub fn fail_next_write(&self) {
        self.fail_next_write.store(true, Ordering::SeqCst);
    }

    pub fn fallout_count(&self) -> usize {
        self.audit.lock().fallouts.len()
    }

    pub fn step_count(&self) -> usize {
        self.audit.lock().steps.len()
    }

    fn take_injected_failure(&self) -> Result<()> {
        if self.fail_next_write.swap(false, Ordering::SeqCst) {
            return Err(FalloutError::Persistence(
                "injected write failure; transaction rolled back".to_string(),
            ));
        }
        Ok(())
    }

    /// Stage a fallout and its first step, then commit both or neither
    fn append_fallout_with_step(
        &self,
        tables: &mut AuditTables,
        fallout: NewFallout,
        first_step: NewResolutionStep,
    ) -> Result<i64> {
        let now = Utc::now();
        let fallout_id = tables.next_fallout_id + 1;
        let step_id = tables.next_step_id + 1;
        let record = fallout.into_record(fallout_id, now);
        let step = first_step.into_step(step_id, fallout_id, now);

        self.take_injected_failure()?;

        tables.next_fallout_id = fallout_id;
        tables.next_step_id = step_id;
        tables.fallouts.push(record);
        tables.steps.push(step);
        Ok(fallout_id)
    }
}

#[async_trait]
impl AuditStore for InMemoryAuditStore {
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer> {
        if self.customers.contains_key(&customer.customer_id) {
            return Err(FalloutError::Persistence(format!(
                "duplicate key value violates unique constraint customers_pkey: {}",
                customer.customer_id
            )));
        }
        let created = customer.into_customer(Utc::now());
        self.customers
            .insert(created.customer_id.clone(), created.clone());
        Ok(created)
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order> {
        if !self.customers.contains_key(&order.customer_id) {
            return Err(FalloutError::customer_not_found(order.customer_id));
        }
        if self.orders.contains_key(&order.order_id) {
            return Err(FalloutError::Persistence(format!(
                "duplicate key value violates unique constraint orders_pkey: {}",
                order.order_id
            )));
        }
        let created = order.into_order(Utc::now());
        self.orders.insert(created.order_id.clone(), created.clone());
        Ok(created)
    }

    async fn get_order(&self, order_id: &str) -> Result<Order> {
        self.orders
            .get(order_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FalloutError::order_not_found(order_id))
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Customer> {
        self.customers
            .get(customer_id)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| FalloutError::customer_not_found(customer_id))
    }

    async fn record_fallout(
        &self,
        fallout: NewFallout,
        first_step: NewResolutionStep,
    ) -> Result<i64> {
        // Read guard keeps the order pinned for the duration of the write
        let _order = self
            .orders
            .get(&fallout.order_id)
            .ok_or_else(|| FalloutError::order_not_found(&fallout.order_id))?;

        let mut tables = self.audit.lock();
        let fallout_id = self.append_fallout_with_step(&mut tables, fallout, first_step)?;
        debug!(fallout_id, "Recorded fallout");
        Ok(fallout_id)
    }

    async fn record_step(&self, fallout_id: i64, step: NewResolutionStep) -> Result<i64> {
        let mut tables = self.audit.lock();
        if !tables.fallout_exists(fallout_id) {
            return Err(FalloutError::fallout_not_found(fallout_id));
        }
        self.take_injected_failure()?;

        let step_id = tables.next_step_id + 1;
        tables.next_step_id = step_id;
        tables
            .steps
            .push(step.into_step(step_id, fallout_id, Utc::now()));
        debug!(fallout_id, step_id, "Recorded resolution step");
        Ok(step_id)
    }

    async fn update_order_sub_status(
        &self,
        order_id: &str,
        change: SubStatusChange,
        fallout: NewFallout,
        first_step: NewResolutionStep,
    ) -> Result<Option<i64>> {
        let mut order = self
            .orders
            .get_mut(order_id)
            .ok_or_else(|| FalloutError::order_not_found(order_id))?;

        if order.sub_status(change.field) != change.expected {
            debug!(
                order_id,
                field = %change.field,
                current = order.sub_status(change.field),
                expected = %change.expected,
                "Sub-status no longer matches, skipping update"
            );
            return Ok(None);
        }

        // Validate the new value before anything is written
        let mut updated = order.value().clone();
        updated
            .set_sub_status(change.field, &change.new_value)
            .map_err(|e| {
                FalloutError::Persistence(format!(
                    "check constraint violated for {}: {e}",
                    change.field
                ))
            })?;
        updated.updated_at = Utc::now();

        let mut tables = self.audit.lock();
        let fallout_id = self.append_fallout_with_step(&mut tables, fallout, first_step)?;
        *order = updated;
        Ok(Some(fallout_id))
    }

    async fn get_resolution_history(&self, order_id: &str) -> Result<ResolutionHistory> {
        if !self.orders.contains_key(order_id) {
            return Err(FalloutError::order_not_found(order_id));
        }
        let tables = self.audit.lock();
        let entries = tables
            .fallouts
            .iter()
            .filter(|f| f.order_id == order_id)
            .flat_map(|f| {
                tables
                    .steps
                    .iter()
                    .filter(move |s| s.fallout_id == f.fallout_id)
                    .map(move |s| ResolutionHistoryEntry {
                        fallout_id: f.fallout_id,
                        order_id: f.order_id.clone(),
                        resolution_kind: f.resolution_kind.clone(),
                        fallout_status: f.status,
                        detail: f.detail.clone(),
                        step_id: s.step_id,
                        actor: s.actor.clone(),
                        action: s.action.clone(),
                        result: s.result.clone(),
                        step_created_at: s.created_at,
                    })
            })
            .collect();
        Ok(ResolutionHistory::new(entries))
    }

    async fn list_fallouts(&self, order_id: &str) -> Result<Vec<FalloutRecord>> {
        let tables = self.audit.lock();
        Ok(tables
            .fallouts
            .iter()
            .filter(|f| f.order_id == order_id)
            .cloned()
            .collect())
    }

    async fn list_fallout_candidates(&self, limit: i64) -> Result<Vec<Order>> {
        let limit = usize::try_from(limit).unwrap_or(0);
        let mut candidates: Vec<Order> = self
            .orders
            .iter()
            .filter(|entry| entry.value().is_fallout())
            .map(|entry| entry.value().clone())
            .collect();
        {
            let tables = self.audit.lock();
            candidates.retain(|order| !tables.awaiting_decision(&order.order_id));
        }
        candidates.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.order_id.cmp(&b.order_id))
        });
        candidates.truncate(limit);
        Ok(candidates)
    }
}
