//! # Orchestration
//!
//! The [`WorkflowEngine`] that drives single traversals, the
//! [`HumanDecisionSource`] seam used to finish suspended ones, and the
//! [`FalloutSweep`] that runs many traversals concurrently.
//!
//! ## Example
//!
//! ```rust,no_run
//! use fallout_core::classifier::RuleBasedClassifier;
//! use fallout_core::config::EngineConfig;
//! use fallout_core::orchestration::{FixedDecision, WorkflowEngine};
//! use fallout_core::store::InMemoryAuditStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let store = Arc::new(InMemoryAuditStore::new());
//! let engine = WorkflowEngine::new(store, Arc::new(RuleBasedClassifier::new()), EngineConfig::default());
//! let state = engine
//!     .run_to_completion("ORD123", &FixedDecision::new("approve"))
//!     .await?;
//! println!("{}", state.resolution_status());
//! # Ok(())
//! # }
//! ```

pub mod decision;
pub mod engine;
pub mod sweep;

pub use decision::{FixedDecision, HumanDecisionSource};
pub use engine::WorkflowEngine;
pub use sweep::{FalloutSweep, SweepReport};
