//! Delicious store model library.
//!
//! The `Store` document with its lifecycle steps (validation, slug
//! derivation, review population) and the convenience queries built on it:
//! tag histogram, top-rated stores, keyword search and proximity search.
//!
//! ```no_run
//! use delicious_stores::db::MemoryStoreBackend;
//! use delicious_stores::services::StoreModel;
//!
//! # async fn demo() -> Result<(), delicious_stores::error::StoreError> {
//! let model = StoreModel::new(MemoryStoreBackend::new());
//! let tags = model.get_tags_list().await?;
//! assert!(tags.is_empty());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod aggregate;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod services;
pub mod slug;
pub mod validation;

pub use config::{ConfigError, StoresConfig};
pub use db::{MemoryStoreBackend, PgStoreBackend, RepositoryError, StoreBackend};
pub use error::StoreError;
pub use services::StoreModel;
