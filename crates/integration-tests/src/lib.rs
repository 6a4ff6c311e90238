//! Integration tests for Delicious.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory backend only
//! cargo test -p delicious-integration-tests
//!
//! # Including PostgreSQL (needs DELICIOUS_DATABASE_URL; the tables are truncated)
//! cargo test -p delicious-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `store_model` - Store model behavior against the in-memory backend
//! - `postgres_store_model` - The same behavior against `PostgreSQL`

use std::sync::OnceLock;

use delicious_core::{StoreId, UserId};
use delicious_stores::db::{PgStoreBackend, create_pool, run_migrations};
use delicious_stores::models::{LocationInput, ReviewInput, StoreInput, UserInput};
use delicious_stores::{MemoryStoreBackend, StoreError, StoreModel, StoresConfig};
use tokio::sync::{Mutex, MutexGuard};

/// A store model over a fresh in-memory backend.
#[must_use]
pub fn memory_model() -> StoreModel {
    StoreModel::new(MemoryStoreBackend::new())
}

/// Serializes tests sharing the `PostgreSQL` database.
pub async fn postgres_lock() -> MutexGuard<'static, ()> {
    static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| Mutex::new(())).lock().await
}

/// A store model over `PostgreSQL`, migrated and emptied.
///
/// # Errors
///
/// Returns an error if configuration is missing or the database is unreachable.
pub async fn postgres_model() -> Result<StoreModel, Box<dyn std::error::Error>> {
    let config = StoresConfig::from_env()?;
    let pool = create_pool(&config).await?;
    run_migrations(&pool).await?;

    sqlx::query("TRUNCATE delicious.review, delicious.store, delicious.user RESTART IDENTITY")
        .execute(&pool)
        .await?;

    Ok(StoreModel::new(PgStoreBackend::new(pool)))
}

/// Create a user to act as store author.
///
/// # Errors
///
/// Returns the model error if the user is rejected.
pub async fn create_author(model: &StoreModel, name: &str) -> Result<UserId, StoreError> {
    let user = model
        .create_user(UserInput {
            name: Some(name.to_owned()),
            email: Some(format!("{}@example.com", name.to_lowercase())),
        })
        .await?;
    Ok(user.id)
}

/// A complete store submission.
#[must_use]
pub fn store_input(name: &str, author: UserId, tags: &[&str], coordinates: [f64; 2]) -> StoreInput {
    StoreInput {
        name: Some(name.to_owned()),
        description: None,
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        location: Some(LocationInput {
            coordinates: coordinates.to_vec(),
            address: Some("1 Queen St W".to_owned()),
        }),
        photo: None,
        author: Some(author),
    }
}

/// A complete review submission.
#[must_use]
pub fn review_input(store: StoreId, author: UserId, rating: i64) -> ReviewInput {
    ReviewInput {
        store: Some(store),
        author: Some(author),
        text: Some("Worth a visit".to_owned()),
        rating: Some(rating),
    }
}
