//! # Structured Logging Module
//!
//! Environment-aware structured logging for workflow traversals and audit
//! writes. Output is human-readable by default and JSON lines when
//! [`LoggingConfig::json`] is set.

use crate::config::LoggingConfig;
use chrono::Utc;
use std::sync::OnceLock;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

static LOGGER_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Initialize structured logging once per process.
///
/// `RUST_LOG` takes precedence, then [`LoggingConfig::level`], then the
/// environment default from [`get_log_level`].
pub fn init_structured_logging(config: &LoggingConfig) {
    LOGGER_INITIALIZED.get_or_init(|| {
        let environment = get_environment();
        let directive = config
            .level
            .clone()
            .unwrap_or_else(|| get_log_level(&environment).to_string());
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

        let layer = if config.json {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .json()
                .with_filter(filter)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_ids(true)
                .with_ansi(true)
                .with_filter(filter)
                .boxed()
        };

        // Another subscriber may already be installed, e.g. by a host application
        if tracing_subscriber::registry().with(layer).try_init().is_err() {
            tracing::debug!("Global tracing subscriber already initialized");
        }

        tracing::info!(
            environment = %environment,
            json = config.json,
            "Structured logging initialized"
        );
    });
}

/// `FALLOUT_ENV`, then `APP_ENV`, defaulting to `development`
pub fn get_environment() -> String {
    std::env::var("FALLOUT_ENV")
        .or_else(|_| std::env::var("APP_ENV"))
        .unwrap_or_else(|_| "development".to_string())
        .to_lowercase()
}

/// Default filter directive per environment
pub fn get_log_level(environment: &str) -> &'static str {
    match environment {
        "production" => "info",
        _ => "debug",
    }
}

/// Log one node visit or engine-level operation of a traversal
pub fn log_workflow_operation(
    operation: &str,
    order_id: &str,
    node: Option<&str>,
    status: &str,
    details: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        order_id = %order_id,
        node = node,
        status = %status,
        details = details,
        timestamp = %Utc::now().to_rfc3339(),
        "WORKFLOW_OPERATION"
    );
}

/// Log an audit write
pub fn log_audit_operation(
    operation: &str,
    order_id: &str,
    fallout_id: Option<i64>,
    actor: &str,
    resolution_kind: Option<&str>,
) {
    tracing::info!(
        operation = %operation,
        order_id = %order_id,
        fallout_id = fallout_id,
        actor = %actor,
        resolution_kind = resolution_kind,
        timestamp = %Utc::now().to_rfc3339(),
        "AUDIT_OPERATION"
    );
}

pub fn log_error(component: &str, operation: &str, error: &str, context: Option<&str>) {
    tracing::error!(
        component = %component,
        operation = %operation,
        error = %error,
        context = context,
        timestamp = %Utc::now().to_rfc3339(),
        "ERROR"
    );
}
