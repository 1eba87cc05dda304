//! # Database Migration System
//!
//! Migrations are embedded at build time from the `migrations/` directory
//! using the `YYYYMMDDHHMMSS_description.sql` naming convention. sqlx tracks
//! applied versions in `_sqlx_migrations` and takes an advisory lock while
//! applying them, so concurrent callers are safe.

use crate::error::Result;
use sqlx::migrate::Migrator;
use sqlx::PgPool;
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub struct DatabaseMigrations;

impl DatabaseMigrations {
    /// Apply all outstanding migrations in order
    pub async fn run_all(pool: &PgPool) -> Result<()> {
        MIGRATOR.run(pool).await?;
        info!(
            migrations = MIGRATOR.iter().count(),
            "Database schema is up to date"
        );
        Ok(())
    }
}
