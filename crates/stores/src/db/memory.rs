//! In-process backend.
//!
//! Holds users, stores and reviews in vectors behind a `tokio` `RwLock` and
//! answers every query by scanning them. Aggregations go through
//! [`crate::aggregate`], keyword search scores by matched terms (no
//! stemming) and proximity uses the haversine distance.

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::Utc;
use regex::RegexBuilder;
use tokio::sync::RwLock;
use tracing::debug;

use delicious_core::{GeoPoint, ReviewId, Slug, StoreId, UserId};

use super::{RepositoryError, StoreBackend};
use crate::aggregate;
use crate::models::{
    NearbyStore, NewReview, NewUser, Review, StoreDocument, StoreFields, StoreFilter,
    StoreSearchHit, TagCount, TopStore, User,
};
use crate::slug::collision_pattern;

#[derive(Debug, Default)]
struct Collections {
    users: Vec<User>,
    stores: Vec<StoreDocument>,
    reviews: Vec<Review>,
    next_user_id: i32,
    next_store_id: i32,
    next_review_id: i32,
}

/// Backend keeping everything in memory. Starts empty.
#[derive(Debug, Default)]
pub struct MemoryStoreBackend {
    collections: RwLock<Collections>,
}

impl MemoryStoreBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn next_id(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

/// Lowercased alphanumeric words.
fn terms(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
}

/// Newest first, ties by id descending.
fn newest_first(a: &StoreDocument, b: &StoreDocument) -> std::cmp::Ordering {
    b.created.cmp(&a.created).then_with(|| b.id.cmp(&a.id))
}

#[async_trait]
impl StoreBackend for MemoryStoreBackend {
    async fn count_slug_collisions(&self, base: &Slug) -> Result<usize, RepositoryError> {
        let pattern = RegexBuilder::new(&collision_pattern(base))
            .case_insensitive(true)
            .build()?;

        let collections = self.collections.read().await;
        Ok(collections
            .stores
            .iter()
            .filter(|s| pattern.is_match(s.slug.as_str()))
            .count())
    }

    async fn insert_store(
        &self,
        fields: &StoreFields,
        slug: &Slug,
    ) -> Result<StoreDocument, RepositoryError> {
        let mut collections = self.collections.write().await;
        if !collections.users.iter().any(|u| u.id == fields.author) {
            return Err(RepositoryError::Conflict(format!(
                "author {} does not exist",
                fields.author
            )));
        }

        let id = StoreId::new(next_id(&mut collections.next_store_id));
        let document = StoreDocument {
            id,
            name: fields.name.clone(),
            slug: slug.clone(),
            description: fields.description.clone(),
            tags: fields.tags.clone(),
            created: Utc::now(),
            location: fields.location.clone(),
            photo: fields.photo.clone(),
            author: fields.author,
        };
        collections.stores.push(document.clone());

        debug!(store_id = %id, slug = %slug, "Inserted store");
        Ok(document)
    }

    async fn update_store(
        &self,
        id: StoreId,
        fields: &StoreFields,
        slug: &Slug,
    ) -> Result<Option<StoreDocument>, RepositoryError> {
        let mut collections = self.collections.write().await;
        let Some(document) = collections.stores.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };

        document.name.clone_from(&fields.name);
        document.slug = slug.clone();
        document.description.clone_from(&fields.description);
        document.tags.clone_from(&fields.tags);
        document.location = fields.location.clone();
        document.photo.clone_from(&fields.photo);

        Ok(Some(document.clone()))
    }

    async fn delete_store(&self, id: StoreId) -> Result<bool, RepositoryError> {
        let mut collections = self.collections.write().await;
        let before = collections.stores.len();
        collections.stores.retain(|s| s.id != id);
        Ok(collections.stores.len() < before)
    }

    async fn find_stores(
        &self,
        filter: &StoreFilter,
    ) -> Result<Vec<StoreDocument>, RepositoryError> {
        let collections = self.collections.read().await;
        let mut matched: Vec<StoreDocument> = collections
            .stores
            .iter()
            .filter(|s| filter.matches(s))
            .cloned()
            .collect();
        matched.sort_by(newest_first);

        Ok(matched
            .into_iter()
            .skip(filter.skip)
            .take(filter.limit.unwrap_or(usize::MAX))
            .collect())
    }

    async fn reviews_for_stores(
        &self,
        stores: &[StoreId],
    ) -> Result<Vec<Review>, RepositoryError> {
        let wanted: HashSet<StoreId> = stores.iter().copied().collect();
        let collections = self.collections.read().await;
        Ok(collections
            .reviews
            .iter()
            .filter(|r| wanted.contains(&r.store))
            .cloned()
            .collect())
    }

    async fn tag_counts(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let collections = self.collections.read().await;
        Ok(aggregate::tag_counts(&collections.stores))
    }

    async fn top_stores(
        &self,
        min_reviews: usize,
        limit: usize,
    ) -> Result<Vec<TopStore>, RepositoryError> {
        let collections = self.collections.read().await;
        let mut stores = collections.stores.clone();
        // ties on the average fall back to id order, like the SQL query
        stores.sort_by_key(|s| s.id);
        Ok(aggregate::top_stores(
            &stores,
            &collections.reviews,
            min_reviews,
            limit,
        ))
    }

    async fn search_stores(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<StoreSearchHit>, RepositoryError> {
        let wanted: HashSet<String> = terms(query).collect();
        if wanted.is_empty() {
            return Ok(Vec::new());
        }

        let collections = self.collections.read().await;
        let mut hits: Vec<StoreSearchHit> = collections
            .stores
            .iter()
            .filter_map(|s| {
                let words: HashSet<String> = terms(&s.name)
                    .chain(s.description.as_deref().into_iter().flat_map(terms))
                    .collect();
                let matched = wanted.intersection(&words).count();
                #[allow(clippy::cast_precision_loss)] // term counts are tiny
                let score = matched as f64;
                (matched > 0).then(|| StoreSearchHit {
                    id: s.id,
                    slug: s.slug.clone(),
                    name: s.name.clone(),
                    score,
                })
            })
            .collect();

        hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
        hits.truncate(limit);
        Ok(hits)
    }

    async fn nearby_stores(
        &self,
        origin: GeoPoint,
        max_distance_m: f64,
        limit: usize,
    ) -> Result<Vec<NearbyStore>, RepositoryError> {
        let collections = self.collections.read().await;
        let mut nearby: Vec<NearbyStore> = collections
            .stores
            .iter()
            .filter_map(|s| {
                let distance_m = origin.distance_meters(&s.location.coordinates);
                (distance_m <= max_distance_m).then(|| NearbyStore {
                    id: s.id,
                    slug: s.slug.clone(),
                    name: s.name.clone(),
                    description: s.description.clone(),
                    location: s.location.clone(),
                    photo: s.photo.clone(),
                    distance_m,
                })
            })
            .collect();

        nearby.sort_by(|a, b| {
            a.distance_m
                .total_cmp(&b.distance_m)
                .then_with(|| a.id.cmp(&b.id))
        });
        nearby.truncate(limit);
        Ok(nearby)
    }

    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut collections = self.collections.write().await;
        if collections.users.iter().any(|u| u.email == user.email) {
            return Err(RepositoryError::Conflict("email already exists".to_owned()));
        }

        let created = User {
            id: UserId::new(next_id(&mut collections.next_user_id)),
            name: user.name.clone(),
            email: user.email.clone(),
            created: Utc::now(),
        };
        collections.users.push(created.clone());
        Ok(created)
    }

    async fn user_exists(&self, id: UserId) -> Result<bool, RepositoryError> {
        let collections = self.collections.read().await;
        Ok(collections.users.iter().any(|u| u.id == id))
    }

    async fn insert_review(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let mut collections = self.collections.write().await;
        let created = Review {
            id: ReviewId::new(next_id(&mut collections.next_review_id)),
            store: review.store,
            author: review.author,
            text: review.text.clone(),
            rating: review.rating,
            created: Utc::now(),
        };
        collections.reviews.push(created.clone());
        Ok(created)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::models::Location;

    async fn seeded() -> (MemoryStoreBackend, UserId) {
        let backend = MemoryStoreBackend::new();
        let user = backend
            .insert_user(&NewUser {
                name: "Wes".to_owned(),
                email: "wes@example.com".to_owned(),
            })
            .await
            .unwrap();
        (backend, user.id)
    }

    fn fields(author: UserId, name: &str, lng: f64, lat: f64) -> StoreFields {
        StoreFields {
            name: name.to_owned(),
            description: Some(format!("{name} serves coffee")),
            tags: vec!["Cafe".to_owned()],
            location: Location::new(GeoPoint::new(lng, lat).unwrap(), "Main St"),
            photo: None,
            author,
        }
    }

    #[tokio::test]
    async fn test_slug_metacharacters_match_literally() {
        let (backend, author) = seeded().await;
        for stored in ["cafe.soul", "cafexsoul"] {
            backend
                .insert_store(&fields(author, "Cafe", 0.0, 0.0), &Slug::from_stored(stored))
                .await
                .unwrap();
        }

        let count = backend
            .count_slug_collisions(&Slug::from_stored("cafe.soul"))
            .await
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test]
    async fn test_insert_requires_existing_author() {
        let backend = MemoryStoreBackend::new();
        let err = backend
            .insert_store(
                &fields(UserId::new(99), "Ghost", 0.0, 0.0),
                &Slug::from_name("Ghost"),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_count_slug_collisions() {
        let (backend, author) = seeded().await;
        for slug in ["cafe-soul", "cafe-soul-2", "cafe-soul-food"] {
            backend
                .insert_store(&fields(author, "x", 0.0, 0.0), &Slug::from_stored(slug))
                .await
                .unwrap();
        }

        let count = backend
            .count_slug_collisions(&Slug::from_name("Cafe Soul"))
            .await
            .unwrap();
        assert_eq!(count, 2);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let (backend, _) = seeded().await;
        let err = backend
            .insert_user(&NewUser {
                name: "Other".to_owned(),
                email: "wes@example.com".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_find_pagination_newest_first() {
        let (backend, author) = seeded().await;
        for name in ["One", "Two", "Three"] {
            backend
                .insert_store(&fields(author, name, 0.0, 0.0), &Slug::from_name(name))
                .await
                .unwrap();
        }

        let page = backend
            .find_stores(&StoreFilter::default().paginate(1, 1))
            .await
            .unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name, "Two");
    }

    #[tokio::test]
    async fn test_delete_leaves_reviews() {
        let (backend, author) = seeded().await;
        let store = backend
            .insert_store(&fields(author, "Gone", 0.0, 0.0), &Slug::from_name("Gone"))
            .await
            .unwrap();
        backend
            .insert_review(&NewReview {
                store: store.id,
                author,
                text: "was nice".to_owned(),
                rating: delicious_core::Rating::new(4).unwrap(),
            })
            .await
            .unwrap();

        assert!(backend.delete_store(store.id).await.unwrap());
        assert!(!backend.delete_store(store.id).await.unwrap());
        assert_eq!(backend.reviews_for_stores(&[store.id]).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_search_scores_by_matched_terms() {
        let (backend, author) = seeded().await;
        backend
            .insert_store(&fields(author, "Soul Cafe", 0.0, 0.0), &Slug::from_name("Soul Cafe"))
            .await
            .unwrap();
        backend
            .insert_store(&fields(author, "Bagel Hut", 0.0, 0.0), &Slug::from_name("Bagel Hut"))
            .await
            .unwrap();

        let hits = backend.search_stores("soul COFFEE", 5).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].name, "Soul Cafe");
        assert!(hits[0].score > hits[1].score);

        assert!(backend.search_stores("  ", 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_nearby_orders_by_distance() {
        let (backend, author) = seeded().await;
        backend
            .insert_store(&fields(author, "Far", 0.05, 0.0), &Slug::from_name("Far"))
            .await
            .unwrap();
        backend
            .insert_store(&fields(author, "Near", 0.01, 0.0), &Slug::from_name("Near"))
            .await
            .unwrap();
        backend
            .insert_store(&fields(author, "Away", 1.0, 0.0), &Slug::from_name("Away"))
            .await
            .unwrap();

        let origin = GeoPoint::new(0.0, 0.0).unwrap();
        let nearby = backend.nearby_stores(origin, 10_000.0, 10).await.unwrap();
        let names: Vec<_> = nearby.iter().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["Near", "Far"]);
        assert!(nearby[0].distance_m < nearby[1].distance_m);
    }
}
