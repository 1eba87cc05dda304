use thiserror::Error;

/// Errors raised when a traversal tries to leave the allowed status graph
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StateMachineError {
    #[error("Invalid status transition from {from} on event {event}")]
    InvalidTransition { from: String, event: String },

    #[error("Traversal already terminal in status {status}")]
    AlreadyTerminal { status: String },

    #[error("Node {node} already ran in this traversal")]
    NodeRevisited { node: String },
}

pub type StateMachineResult<T> = Result<T, StateMachineError>;
