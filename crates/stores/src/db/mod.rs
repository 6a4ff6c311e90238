//! Persistence for the store model.
//!
//! # Database: `PostgreSQL`, schema `delicious`
//!
//! ## Tables
//!
//! - `user` - Store authors and reviewers
//! - `store` - Stores (text index over name + description, spatial index
//!   over the location point)
//! - `review` - Reviews, looked up by `store_id` to populate `Store.reviews`
//!
//! # Backends
//!
//! [`StoreBackend`] is the seam between the store model and a database. It
//! exposes raw primitives only; slug derivation, validation and review
//! population live in [`crate::services::StoreModel`].
//!
//! - [`PgStoreBackend`] - `PostgreSQL` via `sqlx`
//! - [`MemoryStoreBackend`] - in-process, same semantics, for tests and demos
//!
//! # Migrations
//!
//! Migrations are stored in `crates/stores/migrations/` and run via:
//! ```bash
//! cargo run -p delicious-cli -- migrate
//! ```

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use delicious_core::{GeoPoint, Slug, StoreId, UserId};

pub use memory::MemoryStoreBackend;
pub use postgres::PgStoreBackend;

use crate::config::StoresConfig;
use crate::models::{
    NearbyStore, NewReview, NewUser, Review, StoreDocument, StoreFields, StoreFilter,
    StoreSearchHit, TagCount, TopStore, User,
};

/// Embedded schema migrations.
pub static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Migration failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// A slug collision pattern failed to compile.
    #[error("slug pattern error: {0}")]
    Pattern(#[from] regex::Error),

    /// Constraint violation (e.g., unique email, missing author row).
    #[error("constraint violation: {0}")]
    Conflict(String),
}

/// Raw persistence primitives for stores and the entities they reference.
///
/// Implementations perform no validation and no slug derivation. Every
/// method is a single independent request; no ordering or atomicity is
/// guaranteed between calls.
#[async_trait]
pub trait StoreBackend: Send + Sync {
    /// Count stores whose slug matches [`crate::slug::collision_pattern`]
    /// for `base`, case-insensitively.
    async fn count_slug_collisions(&self, base: &Slug) -> Result<usize, RepositoryError>;

    /// Insert a store; `id` and `created` are assigned by the backend.
    async fn insert_store(
        &self,
        fields: &StoreFields,
        slug: &Slug,
    ) -> Result<StoreDocument, RepositoryError>;

    /// Replace the editable fields and slug of a store. `None` if `id` is unknown.
    async fn update_store(
        &self,
        id: StoreId,
        fields: &StoreFields,
        slug: &Slug,
    ) -> Result<Option<StoreDocument>, RepositoryError>;

    /// Delete a store. Reviews pointing at it are left alone.
    async fn delete_store(&self, id: StoreId) -> Result<bool, RepositoryError>;

    /// Stores matching `filter`, newest first.
    async fn find_stores(&self, filter: &StoreFilter)
    -> Result<Vec<StoreDocument>, RepositoryError>;

    /// Every review whose `store` is one of `stores`, oldest first.
    async fn reviews_for_stores(&self, stores: &[StoreId])
    -> Result<Vec<Review>, RepositoryError>;

    /// Tag histogram, count descending.
    async fn tag_counts(&self) -> Result<Vec<TagCount>, RepositoryError>;

    /// Stores with at least `min_reviews` reviews, by mean rating descending.
    async fn top_stores(
        &self,
        min_reviews: usize,
        limit: usize,
    ) -> Result<Vec<TopStore>, RepositoryError>;

    /// Keyword search over name and description, most relevant first.
    async fn search_stores(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<StoreSearchHit>, RepositoryError>;

    /// Stores within `max_distance_m` of `origin`, nearest first.
    async fn nearby_stores(
        &self,
        origin: GeoPoint,
        max_distance_m: f64,
        limit: usize,
    ) -> Result<Vec<NearbyStore>, RepositoryError>;

    /// Insert a user. Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError>;

    /// Whether a user with this id exists.
    async fn user_exists(&self, id: UserId) -> Result<bool, RepositoryError>;

    /// Insert a review.
    async fn insert_review(&self, review: &NewReview) -> Result<Review, RepositoryError>;
}

/// Create a `PostgreSQL` connection pool from the store configuration.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(config: &StoresConfig) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(config.database_url.expose_secret())
        .await
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns `RepositoryError::Migration` if a migration fails or the applied
/// history diverges from the embedded one.
pub async fn run_migrations(pool: &PgPool) -> Result<(), RepositoryError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}
