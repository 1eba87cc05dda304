//! Error types for the fallout workflow engine.
//!
//! Only `NotFound` and `Persistence` are meant to reach a caller at traversal
//! entry. Handler failures are converted into escalations by the engine, and a
//! routing label outside the known set is not an error at all (see
//! [`crate::workflow::EscalationCause::UnrecognizedLabel`]).

use crate::state_machine::StateMachineError;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FalloutError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Handler fault in {handler}: {reason}")]
    HandlerFault { handler: String, reason: String },

    #[error("State machine error: {0}")]
    StateMachine(String),

    #[error("Invalid resume: {0}")]
    InvalidResume(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl FalloutError {
    pub fn order_not_found(order_id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "order",
            id: order_id.into(),
        }
    }

    pub fn customer_not_found(customer_id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: "customer",
            id: customer_id.into(),
        }
    }

    pub fn fallout_not_found(fallout_id: i64) -> Self {
        Self::NotFound {
            entity: "fallout",
            id: fallout_id.to_string(),
        }
    }

    pub fn handler_fault(handler: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::HandlerFault {
            handler: handler.into(),
            reason: reason.into(),
        }
    }

    /// True for errors that abort a traversal instead of degrading to escalation
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::Persistence(_))
    }
}

impl From<sqlx::Error> for FalloutError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Self::NotFound {
                entity: "row",
                id: "unknown".to_string(),
            },
            other => Self::Persistence(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for FalloutError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        Self::Persistence(format!("migration failed: {err}"))
    }
}

impl From<serde_json::Error> for FalloutError {
    fn from(err: serde_json::Error) -> Self {
        Self::Persistence(format!("JSON serialization error: {err}"))
    }
}

impl From<StateMachineError> for FalloutError {
    fn from(err: StateMachineError) -> Self {
        Self::StateMachine(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, FalloutError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FalloutError::order_not_found("ORD123");
        assert_eq!(err.to_string(), "order not found: ORD123");

        let err = FalloutError::handler_fault("esim_agent", "boom");
        assert_eq!(err.to_string(), "Handler fault in esim_agent: boom");
    }

    #[test]
    fn test_fatal_classification() {
        assert!(FalloutError::order_not_found("ORD1").is_fatal());
        assert!(FalloutError::Persistence("disk full".into()).is_fatal());
        assert!(!FalloutError::handler_fault("switch_agent", "x").is_fatal());
        assert!(!FalloutError::InvalidResume("x".into()).is_fatal());
    }

    #[test]
    fn test_sqlx_conversion() {
        let err: FalloutError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, FalloutError::Persistence(_)));

        let err: FalloutError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, FalloutError::NotFound { .. }));
    }
}
