#![allow(clippy::doc_markdown)] // Allow technical terms like PostgreSQL, SQLx in docs
#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Fallout Core Rust
//!
//! Workflow engine for telecom order fallout: routes a malfunctioning order
//! to exactly one specialist remediation, or to a human, and records every
//! attempt in an append-only, transactional audit trail.
//!
//! ## Architecture
//!
//! ```text
//! master (classifier) -> resubmission | esim | switch -> completed
//!                     -> human_escalate --suspend--> human_resume -> completed
//! ```
//!
//! - The **classifier** is an injected oracle; unknown labels route to a human
//! - **Specialists** apply one idempotent compare-and-set remediation each
//! - The **escalation gate** suspends by returning a serializable
//!   [`PausedTraversal`](workflow::PausedTraversal) instead of blocking
//! - The **audit store** writes sub-status changes, fallouts and their steps
//!   atomically, serialized per order
//!
//! ## Module Organization
//!
//! - [`store`] - Audit store trait with PostgreSQL and in-memory implementations
//! - [`context`] - Read-side order snapshots and history
//! - [`classifier`] - Routing oracle trait and the rule-based classifier
//! - [`handlers`] - Specialist handlers and the escalation/resume gate
//! - [`orchestration`] - Workflow engine and concurrent fallout sweep
//! - [`state_machine`] - Resolution status graph and routing nodes
//! - [`workflow`] - Per-traversal state and diagnostics
//! - [`models`] - Orders, customers, fallouts, resolution steps
//! - [`config`] - Layered configuration
//! - [`database`] - Pool construction and migrations
//! - [`logging`] - Structured tracing setup
//! - [`error`] - Error taxonomy
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use fallout_core::classifier::RuleBasedClassifier;
//! use fallout_core::config::ConfigManager;
//! use fallout_core::database::DatabaseConnection;
//! use fallout_core::orchestration::{FixedDecision, WorkflowEngine};
//! use fallout_core::store::PgAuditStore;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! fallout_core::logging::init_structured_logging(&manager.config().logging);
//!
//! let db = DatabaseConnection::connect(&manager.config().database).await?;
//! let engine = WorkflowEngine::new(
//!     Arc::new(PgAuditStore::new(db.pool().clone())),
//!     Arc::new(RuleBasedClassifier::new()),
//!     manager.config().engine.clone(),
//! );
//!
//! let state = engine
//!     .run_to_completion("ORD123", &FixedDecision::new("approve"))
//!     .await?;
//! println!("{} -> {}", state.order_id, state.resolution_status());
//! # Ok(())
//! # }
//! ```
//!
//! ## Testing
//!
//! ```bash
//! cargo test --lib    # Unit tests
//! cargo test          # Unit and integration tests against the in-memory store
//! DATABASE_URL=postgresql://... cargo test -- --ignored   # PostgreSQL store tests
//! ```

pub mod classifier;
pub mod config;
pub mod constants;
pub mod context;
pub mod database;
pub mod error;
pub mod handlers;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod state_machine;
pub mod store;
pub mod workflow;

pub use classifier::{Classifier, RoutingLabel, RuleBasedClassifier};
pub use config::{ConfigManager, DatabaseConfig, EngineConfig, FalloutConfig, LoggingConfig};
pub use context::OrderContextProvider;
pub use error::{FalloutError, Result};
pub use models::{
    Customer, FalloutRecord, FalloutStatus, Order, OrderSnapshot, ResolutionHistory,
    ResolutionStep,
};
pub use orchestration::{FalloutSweep, HumanDecisionSource, SweepReport, WorkflowEngine};
pub use state_machine::{NodeTarget, ResolutionStatus};
pub use store::{AuditStore, InMemoryAuditStore, PgAuditStore};
pub use workflow::{PausedTraversal, TraversalOutcome, WorkflowState};
