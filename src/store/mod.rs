//! # Audit Store
//!
//! Durable, transactional record of orders, fallouts and resolution steps.
//!
//! ## Atomicity Contract
//!
//! Every write method that touches more than one row is a single unit:
//!
//! - [`AuditStore::record_fallout`] writes the fallout **and** its first step
//! - [`AuditStore::update_order_sub_status`] writes the sub-status change, the
//!   companion fallout and its first step
//!
//! Either everything persists or nothing does; on failure the store rolls back
//! and returns [`FalloutError::Persistence`](crate::error::FalloutError::Persistence).
//! Writes for the same order are serialized, so a concurrent remediation can
//! never interleave between a sub-status update and its audit rows.
//!
//! ## Implementations
//!
//! - [`PgAuditStore`]: PostgreSQL via sqlx, row locks with `SELECT ... FOR UPDATE`
//! - [`InMemoryAuditStore`]: process-local tables for tests and embedding

pub mod memory;
pub mod postgres;

pub use memory::InMemoryAuditStore;
pub use postgres::PgAuditStore;

use crate::error::Result;
use crate::models::{
    Customer, FalloutRecord, NewCustomer, NewFallout, NewOrder, NewResolutionStep, Order,
    ResolutionHistory, SubStatusChange,
};
use async_trait::async_trait;

#[async_trait]
pub trait AuditStore: Send + Sync {
    /// Insert a customer at intake
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer>;

    /// Insert an order at intake; the customer must exist
    async fn create_order(&self, order: NewOrder) -> Result<Order>;

    async fn get_order(&self, order_id: &str) -> Result<Order>;

    async fn get_customer(&self, customer_id: &str) -> Result<Customer>;

    /// Record a fallout together with its originating step, returning the fallout id
    async fn record_fallout(&self, fallout: NewFallout, first_step: NewResolutionStep)
        -> Result<i64>;

    /// Append a step to an existing fallout, returning the step id
    async fn record_step(&self, fallout_id: i64, step: NewResolutionStep) -> Result<i64>;

    /// Apply a compare-and-set sub-status change together with its audit rows.
    ///
    /// Returns `Ok(None)` without writing anything when the column no longer
    /// holds `change.expected`.
    async fn update_order_sub_status(
        &self,
        order_id: &str,
        change: SubStatusChange,
        fallout: NewFallout,
        first_step: NewResolutionStep,
    ) -> Result<Option<i64>>;

    /// Joined fallout/step rows for an order, ascending by step timestamp
    async fn get_resolution_history(&self, order_id: &str) -> Result<ResolutionHistory>;

    /// Fallout records for an order, oldest first
    async fn list_fallouts(&self, order_id: &str) -> Result<Vec<FalloutRecord>>;

    /// Orders with at least one faulty sub-status, oldest first.
    ///
    /// Orders whose latest fallout is an escalation still waiting for a
    /// human decision are left out.
    async fn list_fallout_candidates(&self, limit: i64) -> Result<Vec<Order>>;
}
