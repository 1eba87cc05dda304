//! # Fallout Configuration System
//!
//! Layered configuration for the workflow engine, its audit store and logging.
//!
//! ## Sources
//!
//! Later sources override earlier ones:
//!
//! 1. Built-in defaults ([`FalloutConfig::default`])
//! 2. `config/default.toml`
//! 3. `config/{environment}.toml` (optional)
//! 4. `config/local.toml` (optional)
//! 5. Environment variables prefixed `FALLOUT`, `__` as separator,
//!    e.g. `FALLOUT__DATABASE__URL`
//!
//! ## Usage
//!
//! ```rust,no_run
//! use fallout_core::config::ConfigManager;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = ConfigManager::load()?;
//! let max_chars = manager.config().engine.rationale_max_chars;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod loader;

pub use error::{ConfigResult, ConfigurationError};
pub use loader::ConfigManager;

use crate::constants::system;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct FalloutConfig {
    pub database: DatabaseConfig,
    pub engine: EngineConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_seconds: u64,
    /// Apply embedded migrations when connecting
    pub run_migrations: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: system::DEFAULT_DATABASE_URL.to_string(),
            max_connections: system::DEFAULT_MAX_CONNECTIONS,
            acquire_timeout_seconds: system::DEFAULT_ACQUIRE_TIMEOUT_SECONDS,
            run_migrations: false,
        }
    }
}

impl DatabaseConfig {
    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.acquire_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Bound on the escalation rationale stored in the fallout detail
    pub rationale_max_chars: usize,
    /// Candidates fetched per sweep
    pub sweep_batch_size: i64,
    /// Traversals a sweep runs at once
    pub sweep_concurrency: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rationale_max_chars: system::DEFAULT_RATIONALE_MAX_CHARS,
            sweep_batch_size: system::DEFAULT_SWEEP_BATCH_SIZE,
            sweep_concurrency: system::DEFAULT_SWEEP_CONCURRENCY,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// EnvFilter directive; `RUST_LOG` wins when set
    pub level: Option<String>,
    /// Emit JSON lines instead of human-readable output
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: None,
            json: false,
        }
    }
}

impl FalloutConfig {
    pub fn validate(&self) -> ConfigResult<()> {
        if self.database.url.trim().is_empty() {
            return Err(ConfigurationError::missing_required_field("database.url", "database"));
        }
        if self.database.max_connections == 0 {
            return Err(ConfigurationError::invalid_value(
                "database.max_connections",
                "0",
                "must be greater than zero",
            ));
        }
        if self.engine.rationale_max_chars == 0 {
            return Err(ConfigurationError::invalid_value(
                "engine.rationale_max_chars",
                "0",
                "must be greater than zero",
            ));
        }
        if self.engine.sweep_concurrency == 0 {
            return Err(ConfigurationError::invalid_value(
                "engine.sweep_concurrency",
                "0",
                "must be greater than zero",
            ));
        }
        if self.engine.sweep_batch_size < 0 {
            return Err(ConfigurationError::invalid_value(
                "engine.sweep_batch_size",
                self.engine.sweep_batch_size.to_string(),
                "must not be negative",
            ));
        }
        Ok(())
    }
}
