//! # Data Models
//!
//! Orders, customers, fallouts and resolution steps, plus the read-side
//! snapshot and history views built from them.
//!
//! ## Relations
//!
//! ```text
//! customers 1---* orders 1---* fallouts 1---* resolution_steps
//! ```
//!
//! Orders and customers are reference data created at intake. Fallouts and
//! resolution steps form the append-only audit trail.

pub mod customer;
pub mod fallout;
pub mod order;
pub mod resolution_step;
pub mod snapshot;

pub use customer::{Customer, NewCustomer};
pub use fallout::{FalloutRecord, FalloutStatus, NewFallout};
pub use order::{
    ActivationStatus, EsimStatus, NewOrder, Order, SubStatusChange, SubStatusField, SwitchStatus,
};
pub use resolution_step::{
    NewResolutionStep, ResolutionHistory, ResolutionHistoryEntry, ResolutionStep,
};
pub use snapshot::OrderSnapshot;
