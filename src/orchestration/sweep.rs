//! # Fallout Sweep
//!
//! Picks up orders currently in fallout and starts one independent traversal
//! per order, a bounded number at a time. Traversals share only the audit
//! store; each owns its own [`WorkflowState`].

use super::engine::WorkflowEngine;
use crate::error::{FalloutError, Result};
use crate::workflow::{PausedTraversal, TraversalOutcome, WorkflowState};
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Default)]
pub struct SweepReport {
    pub completed: Vec<WorkflowState>,
    /// Traversals parked at the escalation gate; the caller owns them now
    pub suspended: Vec<PausedTraversal>,
    pub aborted: Vec<(String, FalloutError)>,
}

impl SweepReport {
    pub fn total(&self) -> usize {
        self.completed.len() + self.suspended.len() + self.aborted.len()
    }

    fn sort(&mut self) {
        self.completed.sort_by(|a, b| a.order_id.cmp(&b.order_id));
        self.suspended
            .sort_by(|a, b| a.marker.order_id.cmp(&b.marker.order_id));
        self.aborted.sort_by(|a, b| a.0.cmp(&b.0));
    }
}

#[derive(Debug, Clone)]
pub struct FalloutSweep {
    engine: Arc<WorkflowEngine>,
    batch_size: i64,
    concurrency: usize,
}

impl FalloutSweep {
    /// Sweep sized from the engine's configuration
    pub fn new(engine: Arc<WorkflowEngine>) -> Self {
        let config = engine.config().clone();
        Self {
            engine,
            batch_size: config.sweep_batch_size,
            concurrency: config.sweep_concurrency.max(1),
        }
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Run one sweep over the current fallout candidates.
    ///
    /// Only the candidate query itself can fail the sweep; per-order
    /// failures are reported in [`SweepReport::aborted`].
    #[instrument(skip(self), fields(batch_size = self.batch_size, concurrency = self.concurrency))]
    pub async fn run(&self) -> Result<SweepReport> {
        let candidates = self.engine.context().failed_orders(self.batch_size).await?;
        info!(candidates = candidates.len(), "Starting fallout sweep");

        let results: Vec<(String, Result<TraversalOutcome>)> = stream::iter(candidates)
            .map(|order| {
                let engine = Arc::clone(&self.engine);
                async move {
                    let outcome = engine.start(&order.order_id).await;
                    (order.order_id, outcome)
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = SweepReport::default();
        for (order_id, result) in results {
            match result {
                Ok(TraversalOutcome::Completed(state)) => report.completed.push(state),
                Ok(TraversalOutcome::Suspended(paused)) => report.suspended.push(paused),
                Err(e) => report.aborted.push((order_id, e)),
            }
        }
        report.sort();

        info!(
            completed = report.completed.len(),
            suspended = report.suspended.len(),
            aborted = report.aborted.len(),
            "Fallout sweep finished"
        );
        Ok(report)
    }
}
