//! # Database Operations
//!
//! PostgreSQL connection management and schema migrations for the audit store.
//!
//! ## Key Components
//!
//! - [`connection`] - Pool construction from [`DatabaseConfig`](crate::config::DatabaseConfig)
//! - [`migrations`] - Embedded schema migrations from `migrations/`
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use fallout_core::config::DatabaseConfig;
//! use fallout_core::database::DatabaseConnection;
//! use fallout_core::store::PgAuditStore;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let db = DatabaseConnection::connect(&DatabaseConfig::default()).await?;
//! let store = PgAuditStore::new(db.pool().clone());
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod migrations;

pub use connection::DatabaseConnection;
pub use migrations::DatabaseMigrations;
