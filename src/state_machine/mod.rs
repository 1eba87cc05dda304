// State machine module for fallout traversals
//
// Resolution status graph, routing node names, and the events that move a
// traversal between statuses.

pub mod errors;
pub mod events;
pub mod resolution_state_machine;
pub mod states;

// Re-export main types for convenient access
pub use errors::{StateMachineError, StateMachineResult};
pub use events::ResolutionEvent;
pub use resolution_state_machine::{determine_target_status, is_allowed};
pub use states::{NodeTarget, ResolutionStatus};
