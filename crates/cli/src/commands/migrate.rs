//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! delicious migrate
//! ```
//!
//! # Environment Variables
//!
//! - `DELICIOUS_DATABASE_URL` - `PostgreSQL` connection string (falls back to
//!   `DATABASE_URL`)
//!
//! Migrations are embedded from `crates/stores/migrations/`.

use delicious_stores::StoresConfig;
use delicious_stores::db::{MIGRATOR, create_pool, run_migrations};
use tracing::info;

/// Apply all pending migrations.
///
/// # Errors
///
/// Returns an error if configuration is missing, the database is
/// unreachable, or a migration fails.
pub async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = StoresConfig::from_env()?;

    info!("Connecting to database...");
    let pool = create_pool(&config).await?;

    info!(available = MIGRATOR.iter().count(), "Running migrations...");
    run_migrations(&pool).await?;

    info!("Migrations complete!");
    Ok(())
}
