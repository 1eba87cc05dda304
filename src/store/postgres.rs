//! PostgreSQL audit store.
//!
//! Each multi-row write runs in one transaction that first takes the order
//! row lock (`SELECT ... FOR UPDATE`). Dropping an uncommitted sqlx
//! transaction rolls it back, so every early `?` return leaves no rows.

use super::AuditStore;
use crate::error::{FalloutError, Result};
use crate::models::{
    Customer, FalloutRecord, NewCustomer, NewFallout, NewOrder, NewResolutionStep, Order,
    ResolutionHistory, ResolutionHistoryEntry, SubStatusChange,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, Postgres, Row, Transaction};
use tracing::debug;

const ORDER_COLUMNS: &str = "order_id, customer_id, product_category, activation_status, \
     esim_status, switch_status, issue_type, created_at, updated_at";

#[derive(FromRow)]
struct OrderRow {
    order_id: String,
    customer_id: String,
    product_category: String,
    activation_status: String,
    esim_status: String,
    switch_status: String,
    issue_type: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
    type Error = FalloutError;

    fn try_from(row: OrderRow) -> Result<Self> {
        let corrupt = |e: String| {
            FalloutError::Persistence(format!("invalid data in orders row {}: {e}", row.order_id))
        };
        Ok(Order {
            activation_status: row.activation_status.parse().map_err(corrupt)?,
            esim_status: row.esim_status.parse().map_err(corrupt)?,
            switch_status: row.switch_status.parse().map_err(corrupt)?,
            order_id: row.order_id,
            customer_id: row.customer_id,
            product_category: row.product_category,
            issue_type: row.issue_type,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(FromRow)]
struct CustomerRow {
    customer_id: String,
    name: String,
    account_tier: String,
    priority_level: i32,
    created_at: DateTime<Utc>,
}

impl From<CustomerRow> for Customer {
    fn from(row: CustomerRow) -> Self {
        Customer {
            customer_id: row.customer_id,
            name: row.name,
            account_tier: row.account_tier,
            priority_level: row.priority_level,
            created_at: row.created_at,
        }
    }
}

#[derive(FromRow)]
struct FalloutRow {
    fallout_id: i64,
    order_id: String,
    actor: String,
    resolution_kind: String,
    detail: String,
    status: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<FalloutRow> for FalloutRecord {
    type Error = FalloutError;

    fn try_from(row: FalloutRow) -> Result<Self> {
        Ok(FalloutRecord {
            status: row.status.parse().map_err(FalloutError::Persistence)?,
            fallout_id: row.fallout_id,
            order_id: row.order_id,
            actor: row.actor,
            resolution_kind: row.resolution_kind,
            detail: row.detail,
            created_at: row.created_at,
        })
    }
}

#[derive(FromRow)]
struct HistoryRow {
    fallout_id: i64,
    order_id: String,
    resolution_kind: String,
    fallout_status: String,
    detail: String,
    step_id: i64,
    actor: String,
    action: String,
    result: String,
    step_created_at: DateTime<Utc>,
}

impl TryFrom<HistoryRow> for ResolutionHistoryEntry {
    type Error = FalloutError;

    fn try_from(row: HistoryRow) -> Result<Self> {
        Ok(ResolutionHistoryEntry {
            fallout_status: row.fallout_status.parse().map_err(FalloutError::Persistence)?,
            fallout_id: row.fallout_id,
            order_id: row.order_id,
            resolution_kind: row.resolution_kind,
            detail: row.detail,
            step_id: row.step_id,
            actor: row.actor,
            action: row.action,
            result: row.result,
            step_created_at: row.step_created_at,
        })
    }
}

#[derive(Debug, Clone)]
pub struct PgAuditStore {
    pool: PgPool,
}

impl PgAuditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<bool> {
        let row = sqlx::query("SELECT 1 AS health")
            .fetch_one(&self.pool)
            .await?;
        let health: i32 = row.try_get("health")?;
        Ok(health == 1)
    }

    /// Take the per-order row lock for the rest of the transaction
    async fn lock_order(tx: &mut Transaction<'_, Postgres>, order_id: &str) -> Result<OrderRow> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1 FOR UPDATE");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id)
            .fetch_optional(&mut **tx)
            .await?
            .ok_or_else(|| FalloutError::order_not_found(order_id))
    }

    async fn insert_fallout_with_step(
        tx: &mut Transaction<'_, Postgres>,
        fallout: &NewFallout,
        first_step: &NewResolutionStep,
    ) -> Result<i64> {
        let fallout_id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO fallouts (order_id, actor, resolution_kind, detail, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING fallout_id
            "#,
        )
        .bind(&fallout.order_id)
        .bind(&fallout.actor)
        .bind(&fallout.resolution_kind)
        .bind(&fallout.detail)
        .bind(fallout.status.as_str())
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| FalloutError::Persistence(format!("Failed to insert fallout: {e}")))?;

        Self::insert_step(tx, fallout_id, first_step).await?;
        Ok(fallout_id)
    }

    async fn insert_step(
        tx: &mut Transaction<'_, Postgres>,
        fallout_id: i64,
        step: &NewResolutionStep,
    ) -> Result<i64> {
        sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO resolution_steps (fallout_id, actor, action, result)
            VALUES ($1, $2, $3, $4)
            RETURNING step_id
            "#,
        )
        .bind(fallout_id)
        .bind(&step.actor)
        .bind(&step.action)
        .bind(&step.result)
        .fetch_one(&mut **tx)
        .await
        .map_err(|e| FalloutError::Persistence(format!("Failed to insert resolution step: {e}")))
    }
}

#[async_trait]
impl AuditStore for PgAuditStore {
    async fn create_customer(&self, customer: NewCustomer) -> Result<Customer> {
        let row = sqlx::query_as::<_, CustomerRow>(
            r#"
            INSERT INTO customers (customer_id, name, account_tier, priority_level)
            VALUES ($1, $2, $3, $4)
            RETURNING customer_id, name, account_tier, priority_level, created_at
            "#,
        )
        .bind(&customer.customer_id)
        .bind(&customer.name)
        .bind(&customer.account_tier)
        .bind(customer.priority_level)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.into())
    }

    async fn create_order(&self, order: NewOrder) -> Result<Order> {
        // Surface a missing customer as NotFound rather than a foreign key error
        self.get_customer(&order.customer_id).await?;

        let sql = format!(
            "INSERT INTO orders (order_id, customer_id, product_category, activation_status, \
             esim_status, switch_status, issue_type) VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {ORDER_COLUMNS}"
        );
        let row = sqlx::query_as::<_, OrderRow>(&sql)
            .bind(&order.order_id)
            .bind(&order.customer_id)
            .bind(&order.product_category)
            .bind(order.activation_status.as_str())
            .bind(order.esim_status.as_str())
            .bind(order.switch_status.as_str())
            .bind(&order.issue_type)
            .fetch_one(&self.pool)
            .await?;
        row.try_into()
    }

    async fn get_order(&self, order_id: &str) -> Result<Order> {
        let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE order_id = $1");
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(order_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| FalloutError::order_not_found(order_id))?
            .try_into()
    }

    async fn get_customer(&self, customer_id: &str) -> Result<Customer> {
        sqlx::query_as::<_, CustomerRow>(
            r#"
            SELECT customer_id, name, account_tier, priority_level, created_at
            FROM customers
            WHERE customer_id = $1
            "#,
        )
        .bind(customer_id)
        .fetch_optional(&self.pool)
        .await?
        .map(Customer::from)
        .ok_or_else(|| FalloutError::customer_not_found(customer_id))
    }

    async fn record_fallout(
        &self,
        fallout: NewFallout,
        first_step: NewResolutionStep,
    ) -> Result<i64> {
        let mut tx = self.pool.begin().await?;
        Self::lock_order(&mut tx, &fallout.order_id).await?;
        let fallout_id = Self::insert_fallout_with_step(&mut tx, &fallout, &first_step).await?;
        tx.commit().await?;

        debug!(fallout_id, order_id = %fallout.order_id, "Recorded fallout");
        Ok(fallout_id)
    }

    async fn record_step(&self, fallout_id: i64, step: NewResolutionStep) -> Result<i64> {
        let mut tx = self.pool.begin().await?;

        let order_id: Option<String> =
            sqlx::query_scalar("SELECT order_id FROM fallouts WHERE fallout_id = $1")
                .bind(fallout_id)
                .fetch_optional(&mut *tx)
                .await?;
        let order_id = order_id.ok_or_else(|| FalloutError::fallout_not_found(fallout_id))?;

        Self::lock_order(&mut tx, &order_id).await?;
        let step_id = Self::insert_step(&mut tx, fallout_id, &step).await?;
        tx.commit().await?;

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
        let mut tx = self.pool.begin().await?;
        let locked: Order = Self::lock_order(&mut tx, order_id).await?.try_into()?;

        if locked.sub_status(change.field) != change.expected {
            debug!(
                order_id,
                field = %change.field,
                current = locked.sub_status(change.field),
                "Sub-status no longer matches, skipping update"
            );
            tx.rollback().await?;
            return Ok(None);
        }

        // Column name comes from a closed enum, never from input
        let sql = format!(
            "UPDATE orders SET {} = $1, updated_at = NOW() WHERE order_id = $2",
            change.field.column()
        );
        sqlx::query(&sql)
            .bind(&change.new_value)
            .bind(order_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| FalloutError::Persistence(format!("Failed to update {}: {e}", change.field)))?;

        let fallout_id = Self::insert_fallout_with_step(&mut tx, &fallout, &first_step).await?;
        tx.commit().await?;
        Ok(Some(fallout_id))
    }

    async fn get_resolution_history(&self, order_id: &str) -> Result<ResolutionHistory> {
        self.get_order(order_id).await?;

        let rows = sqlx::query_as::<_, HistoryRow>(
            r#"
            SELECT f.fallout_id, f.order_id, f.resolution_kind, f.status AS fallout_status,
                   f.detail, s.step_id, s.actor, s.action, s.result,
                   s.created_at AS step_created_at
            FROM fallouts f
            INNER JOIN resolution_steps s ON s.fallout_id = f.fallout_id
            WHERE f.order_id = $1
            ORDER BY s.created_at ASC, s.step_id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?;

        let entries = rows
            .into_iter()
            .map(ResolutionHistoryEntry::try_from)
            .collect::<Result<Vec<_>>>()?;
        Ok(ResolutionHistory::new(entries))
    }

    async fn list_fallouts(&self, order_id: &str) -> Result<Vec<FalloutRecord>> {
        sqlx::query_as::<_, FalloutRow>(
            r#"
            SELECT fallout_id, order_id, actor, resolution_kind, detail, status, created_at
            FROM fallouts
            WHERE order_id = $1
            ORDER BY created_at ASC, fallout_id ASC
            "#,
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(FalloutRecord::try_from)
        .collect()
    }

    async fn list_fallout_candidates(&self, limit: i64) -> Result<Vec<Order>> {
        let sql = format!(
            "SELECT {ORDER_COLUMNS} FROM orders \
             WHERE (activation_status IN ('not_sent', 'failed') \
                OR esim_status = 'failed' \
                OR switch_status = 'error') \
               AND NOT EXISTS ( \
                 SELECT 1 FROM fallouts f \
                 WHERE f.order_id = orders.order_id \
                   AND f.status = 'escalated' \
                   AND f.fallout_id = ( \
                     SELECT MAX(latest.fallout_id) FROM fallouts latest \
                     WHERE latest.order_id = orders.order_id) \
                   AND NOT EXISTS ( \
                     SELECT 1 FROM resolution_steps s \
                     WHERE s.fallout_id = f.fallout_id AND s.action = 'human_decision')) \
             ORDER BY created_at ASC, order_id ASC \
             LIMIT $1"
        );
        sqlx::query_as::<_, OrderRow>(&sql)
            .bind(limit.max(0))
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Order::try_from)
            .collect()
    }
}
