//! CLI command implementations.

pub mod migrate;
pub mod report;
pub mod seed;

use delicious_stores::db::{PgStoreBackend, create_pool};
use delicious_stores::{StoreModel, StoresConfig};
use tracing::info;

/// Connect to `PostgreSQL` using the environment configuration.
///
/// # Errors
///
/// Returns an error if the configuration is incomplete or the database is
/// unreachable.
pub async fn connect() -> Result<StoreModel, Box<dyn std::error::Error>> {
    let config = StoresConfig::from_env()?;
    let pool = create_pool(&config).await?;
    info!(
        max_connections = config.max_connections,
        "Connected to database"
    );
    Ok(StoreModel::new(PgStoreBackend::new(pool)))
}
