//! Seed stores from a YAML file.
//!
//! The file lists users, stores and reviews. Stores and reviews refer to
//! users (and reviews to stores) by the `key` given earlier in the same
//! file, since database ids are only known after insertion:
//!
//! ```yaml
//! users:
//!   - key: wes
//!     name: Wes Bos
//!     email: wes@example.com
//! stores:
//!   - key: soul
//!     author: wes
//!     name: Cafe Soul
//!     tags: [Cafe, Wifi]
//!     location:
//!       coordinates: [-79.38, 43.65]
//!       address: 1 Queen St W
//! reviews:
//!   - store: soul
//!     author: wes
//!     text: Great espresso
//!     rating: 5
//! ```
//!
//! JSON files with the same shape also load, YAML being a superset.

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::{info, warn};

use delicious_core::{StoreId, UserId};
use delicious_stores::db::MemoryStoreBackend;
use delicious_stores::models::{ReviewInput, StoreInput, UserInput};
use delicious_stores::{StoreError, StoreModel};

use super::report;

/// Errors resolving keys inside a seed file.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("unknown user key '{0}'")]
    UnknownUser(String),
    #[error("unknown store key '{0}'")]
    UnknownStore(String),
    #[error("duplicate key '{0}'")]
    DuplicateKey(String),
    #[error("{key}: {source}")]
    Store {
        key: String,
        #[source]
        source: StoreError,
    },
}

/// A user entry.
#[derive(Debug, Deserialize)]
pub struct SeedUser {
    pub key: String,
    #[serde(flatten)]
    pub user: UserInput,
}

/// A store entry; `author` is a user key.
#[derive(Debug, Deserialize)]
pub struct SeedStore {
    pub key: String,
    pub author: String,
    #[serde(flatten)]
    pub store: StoreInput,
}

/// A review entry; `store` and `author` are keys.
#[derive(Debug, Deserialize)]
pub struct SeedReview {
    pub store: String,
    pub author: String,
    pub text: Option<String>,
    pub rating: Option<i64>,
}

/// Parsed seed file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SeedFile {
    pub users: Vec<SeedUser>,
    pub stores: Vec<SeedStore>,
    pub reviews: Vec<SeedReview>,
}

/// What was inserted.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub users: usize,
    pub stores: usize,
    pub reviews: usize,
}

/// Read and parse a seed file.
///
/// # Errors
///
/// Returns an error if the file is missing or does not parse.
pub async fn load(file_path: &str) -> Result<SeedFile, Box<dyn std::error::Error>> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(format!("File not found: {file_path}").into());
    }

    info!(path = %file_path, "Loading seed file");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;

    info!(
        users = seed.users.len(),
        stores = seed.stores.len(),
        reviews = seed.reviews.len(),
        "Parsed seed file"
    );
    Ok(seed)
}

/// Insert everything in `seed` through the store model, in file order.
///
/// Stops at the first failure; rows inserted before it stay.
///
/// # Errors
///
/// Returns `SeedError` for an unresolvable key or a rejected entry.
pub async fn apply(model: &StoreModel, seed: SeedFile) -> Result<SeedSummary, SeedError> {
    let mut users: HashMap<String, UserId> = HashMap::new();
    let mut stores: HashMap<String, StoreId> = HashMap::new();
    let mut summary = SeedSummary::default();

    for entry in seed.users {
        if users.contains_key(&entry.key) {
            return Err(SeedError::DuplicateKey(entry.key));
        }
        let user = model
            .create_user(entry.user)
            .await
            .map_err(|source| SeedError::Store {
                key: entry.key.clone(),
                source,
            })?;
        users.insert(entry.key, user.id);
        summary.users += 1;
    }

    for entry in seed.stores {
        if stores.contains_key(&entry.key) {
            return Err(SeedError::DuplicateKey(entry.key));
        }
        let author = *users
            .get(&entry.author)
            .ok_or_else(|| SeedError::UnknownUser(entry.author.clone()))?;
        let input = StoreInput {
            author: Some(author),
            ..entry.store
        };
        let store = model
            .create_store(input)
            .await
            .map_err(|source| SeedError::Store {
                key: entry.key.clone(),
                source,
            })?;
        info!(key = %entry.key, slug = %store.slug(), "Seeded store");
        stores.insert(entry.key, store.id());
        summary.stores += 1;
    }

    for entry in seed.reviews {
        let store = *stores
            .get(&entry.store)
            .ok_or_else(|| SeedError::UnknownStore(entry.store.clone()))?;
        let author = *users
            .get(&entry.author)
            .ok_or_else(|| SeedError::UnknownUser(entry.author.clone()))?;
        model
            .create_review(ReviewInput {
                store: Some(store),
                author: Some(author),
                text: entry.text,
                rating: entry.rating,
            })
            .await
            .map_err(|source| SeedError::Store {
                key: entry.store.clone(),
                source,
            })?;
        summary.reviews += 1;
    }

    Ok(summary)
}

fn log_summary(summary: &SeedSummary) {
    info!("Seeding complete!");
    info!("  Users inserted: {}", summary.users);
    info!("  Stores inserted: {}", summary.stores);
    info!("  Reviews inserted: {}", summary.reviews);
}

/// Seed the configured database from a file.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded, the database is
/// unreachable, or an entry is rejected.
pub async fn from_file(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let seed = load(file_path).await?;
    let model = super::connect().await?;

    let summary = apply(&model, seed).await?;
    log_summary(&summary);
    Ok(())
}

/// Seed an in-memory backend and print the tag and top-store reports.
///
/// # Errors
///
/// Returns an error if the file cannot be loaded or an entry is rejected.
pub async fn demo(file_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let seed = load(file_path).await?;
    let model = StoreModel::new(MemoryStoreBackend::new());

    let summary = apply(&model, seed).await?;
    log_summary(&summary);
    if summary.reviews == 0 {
        warn!("No reviews seeded, top stores will be empty");
    }

    report::tags(&model).await?;
    report::top(&model).await?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const SEED: &str = r"
users:
  - key: wes
    name: Wes
    email: wes@example.com
  - key: kait
    name: Kait
    email: kait@example.com
stores:
  - key: soul
    author: wes
    name: Cafe Soul
    description: Espresso and records
    tags: [Cafe, Views]
    location:
      coordinates: [-79.38, 43.65]
      address: 1 Queen St
  - key: hut
    author: kait
    name: Bagel Hut
    tags: [Views]
    location:
      coordinates: [-79.40, 43.66]
      address: 2 King St
reviews:
  - store: soul
    author: kait
    text: Great
    rating: 5
  - store: soul
    author: wes
    text: Good
    rating: 4
";

    #[tokio::test]
    async fn test_apply_resolves_keys() {
        let seed: SeedFile = serde_yaml::from_str(SEED).unwrap();
        let model = StoreModel::new(MemoryStoreBackend::new());

        let summary = apply(&model, seed).await.unwrap();
        assert_eq!(
            summary,
            SeedSummary {
                users: 2,
                stores: 2,
                reviews: 2
            }
        );

        let top = model.get_top_stores().await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].store.slug.as_str(), "cafe-soul");
        assert!((top[0].average_rating - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_json_seed_loads() {
        let seed: SeedFile = serde_yaml::from_str(
            r#"{"users": [{"key": "a", "name": "A", "email": "a@example.com"}]}"#,
        )
        .unwrap();
        assert_eq!(seed.users.len(), 1);
        assert!(seed.stores.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_author_key() {
        let seed: SeedFile = serde_yaml::from_str(
            r"
stores:
  - key: soul
    author: nobody
    name: Cafe Soul
",
        )
        .unwrap();
        let model = StoreModel::new(MemoryStoreBackend::new());

        let err = apply(&model, seed).await.unwrap_err();
        assert!(matches!(err, SeedError::UnknownUser(ref key) if key == "nobody"));
    }

    #[tokio::test]
    async fn test_rejected_store_reports_key() {
        let seed: SeedFile = serde_yaml::from_str(
            r"
users:
  - key: wes
    name: Wes
    email: wes@example.com
stores:
  - key: nowhere
    author: wes
    name: Cafe Soul
",
        )
        .unwrap();
        let model = StoreModel::new(MemoryStoreBackend::new());

        let err = apply(&model, seed).await.unwrap_err();
        assert!(matches!(err, SeedError::Store { ref key, .. } if key == "nowhere"));
    }
}
