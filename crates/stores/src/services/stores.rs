//! The store model.
//!
//! Wraps a [`StoreBackend`] with the lifecycle steps every caller gets:
//!
//! 1. Validation of submitted fields before any write
//! 2. Slug derivation on create, and on update when the name changed
//! 3. Review population on every store read
//!
//! Slug derivation is a count followed by a separate write. Two concurrent
//! creations with the same name can both see the same count and end up with
//! the same slug; nothing detects or repairs this.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, instrument};

use delicious_core::{GeoPoint, Slug, StoreId};

use crate::aggregate::{TOP_STORES_LIMIT, TOP_STORES_MIN_REVIEWS};
use crate::db::StoreBackend;
use crate::error::StoreError;
use crate::models::{
    NearbyStore, Review, ReviewInput, Store, StoreDocument, StoreFilter, StoreInput,
    StoreSearchHit, StoreUpdate, TagCount, TopStore, User, UserInput,
};
use crate::slug::disambiguate;
use crate::validation::{validate_review, validate_store, validate_user};

/// Results returned by [`StoreModel::search_stores`] when no limit is given.
pub const DEFAULT_SEARCH_LIMIT: usize = 5;

/// Radius used by [`StoreModel::nearby_stores`] when none is given.
pub const DEFAULT_NEARBY_DISTANCE_METERS: f64 = 10_000.0;

/// Results returned by [`StoreModel::nearby_stores`] when no limit is given.
pub const DEFAULT_NEARBY_LIMIT: usize = 10;

/// Store model over a shared backend.
#[derive(Clone)]
pub struct StoreModel {
    backend: Arc<dyn StoreBackend>,
}

impl std::fmt::Debug for StoreModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreModel").finish_non_exhaustive()
    }
}

impl StoreModel {
    /// Create a model owning `backend`.
    #[must_use]
    pub fn new(backend: impl StoreBackend + 'static) -> Self {
        Self {
            backend: Arc::new(backend),
        }
    }

    /// Create a model over an already shared backend.
    #[must_use]
    pub fn from_arc(backend: Arc<dyn StoreBackend>) -> Self {
        Self { backend }
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Validate and insert a new store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if a required field is missing or
    /// malformed, `StoreError::UnknownAuthor` if the author does not exist,
    /// and `StoreError::Repository` if the backend fails.
    #[instrument(skip(self, input), fields(name = input.name.as_deref().unwrap_or_default()))]
    pub async fn create_store(&self, input: StoreInput) -> Result<Store, StoreError> {
        let fields = validate_store(&input)?;
        if !self.backend.user_exists(fields.author).await? {
            return Err(StoreError::UnknownAuthor(fields.author));
        }

        let slug = self.derive_slug(&fields.name).await?;
        let document = self.backend.insert_store(&fields, &slug).await?;

        info!(store_id = %document.id, slug = %document.slug, "Created store");
        Ok(document.populate(Vec::new()))
    }

    /// Apply a partial edit to a store and re-validate the result.
    ///
    /// The slug is re-derived only when the trimmed name differs from the
    /// stored one. Returns `None` when no store has this id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` if the edited store is invalid and
    /// `StoreError::Repository` if the backend fails.
    #[instrument(skip(self, update), fields(store_id = %id))]
    pub async fn update_store(
        &self,
        id: StoreId,
        update: StoreUpdate,
    ) -> Result<Option<Store>, StoreError> {
        let Some(current) = self.find_document(StoreFilter::by_id(id)).await? else {
            return Ok(None);
        };

        let fields = validate_store(&update.apply_to(&current))?;
        let slug = if fields.name == current.name {
            current.slug.clone()
        } else {
            self.derive_slug(&fields.name).await?
        };

        let Some(document) = self.backend.update_store(id, &fields, &slug).await? else {
            return Ok(None);
        };

        info!(slug = %document.slug, "Updated store");
        Ok(self.populate(vec![document]).await?.pop())
    }

    /// Delete a store. Its reviews are kept. Returns whether a store was removed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the backend fails.
    #[instrument(skip(self), fields(store_id = %id))]
    pub async fn delete_store(&self, id: StoreId) -> Result<bool, StoreError> {
        let deleted = self.backend.delete_store(id).await?;
        if deleted {
            info!("Deleted store");
        }
        Ok(deleted)
    }

    /// Validate and insert a user.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for a missing name or malformed
    /// email and `StoreError::Repository` (`Conflict`) if the email is taken.
    #[instrument(skip(self, input))]
    pub async fn create_user(&self, input: UserInput) -> Result<User, StoreError> {
        let user = validate_user(&input)?;
        let created = self.backend.insert_user(&user).await?;
        info!(user_id = %created.id, "Created user");
        Ok(created)
    }

    /// Validate and insert a review of an existing store.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Validation` for missing fields or a rating
    /// outside 1..=5, `StoreError::UnknownStore` / `StoreError::UnknownAuthor`
    /// for dangling references, and `StoreError::Repository` if the backend
    /// fails.
    #[instrument(skip(self, input))]
    pub async fn create_review(&self, input: ReviewInput) -> Result<Review, StoreError> {
        let review = validate_review(&input)?;
        if self
            .find_document(StoreFilter::by_id(review.store))
            .await?
            .is_none()
        {
            return Err(StoreError::UnknownStore(review.store));
        }
        if !self.backend.user_exists(review.author).await? {
            return Err(StoreError::UnknownAuthor(review.author));
        }

        let created = self.backend.insert_review(&review).await?;
        info!(review_id = %created.id, store_id = %created.store, "Created review");
        Ok(created)
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Stores matching `filter`, newest first, with reviews populated.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the backend fails.
    #[instrument(skip(self))]
    pub async fn find_stores(&self, filter: &StoreFilter) -> Result<Vec<Store>, StoreError> {
        let documents = self.backend.find_stores(filter).await?;
        self.populate(documents).await
    }

    /// First store matching `filter`, with reviews populated.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the backend fails.
    pub async fn find_store(&self, filter: StoreFilter) -> Result<Option<Store>, StoreError> {
        let filter = StoreFilter {
            limit: Some(1),
            ..filter
        };
        Ok(self.find_stores(&filter).await?.into_iter().next())
    }

    /// Store by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the backend fails.
    pub async fn find_store_by_id(&self, id: StoreId) -> Result<Option<Store>, StoreError> {
        self.find_store(StoreFilter::by_id(id)).await
    }

    /// Store by slug. With colliding slugs, the newest store wins.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the backend fails.
    pub async fn find_store_by_slug(&self, slug: &str) -> Result<Option<Store>, StoreError> {
        self.find_store(StoreFilter::by_slug(Slug::from_stored(slug)))
            .await
    }

    /// Stores carrying `tag` (exact match).
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the backend fails.
    pub async fn stores_by_tag(&self, tag: &str) -> Result<Vec<Store>, StoreError> {
        self.find_stores(&StoreFilter::default().with_tag(tag)).await
    }

    /// Reviews written for `store`, including those left behind when the
    /// store was deleted.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the backend fails.
    pub async fn reviews_for_store(&self, store: StoreId) -> Result<Vec<Review>, StoreError> {
        Ok(self.backend.reviews_for_stores(&[store]).await?)
    }

    /// How many stores carry each tag, most used first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the backend fails.
    #[instrument(skip(self))]
    pub async fn get_tags_list(&self) -> Result<Vec<TagCount>, StoreError> {
        let tags = self.backend.tag_counts().await?;
        debug!(tags = tags.len(), "Counted tags");
        Ok(tags)
    }

    /// Stores with at least two reviews, best average rating first, at most ten.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the backend fails.
    #[instrument(skip(self))]
    pub async fn get_top_stores(&self) -> Result<Vec<TopStore>, StoreError> {
        Ok(self
            .backend
            .top_stores(TOP_STORES_MIN_REVIEWS, TOP_STORES_LIMIT)
            .await?)
    }

    /// Keyword search over name and description, most relevant first.
    ///
    /// A blank query matches nothing.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the backend fails.
    #[instrument(skip(self))]
    pub async fn search_stores(
        &self,
        query: &str,
        limit: Option<usize>,
    ) -> Result<Vec<StoreSearchHit>, StoreError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .backend
            .search_stores(query, limit.unwrap_or(DEFAULT_SEARCH_LIMIT))
            .await?)
    }

    /// Stores within `max_distance_m` meters of `origin`, nearest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Repository` if the backend fails.
    #[instrument(skip(self))]
    pub async fn nearby_stores(
        &self,
        origin: GeoPoint,
        max_distance_m: Option<f64>,
        limit: Option<usize>,
    ) -> Result<Vec<NearbyStore>, StoreError> {
        Ok(self
            .backend
            .nearby_stores(
                origin,
                max_distance_m.unwrap_or(DEFAULT_NEARBY_DISTANCE_METERS),
                limit.unwrap_or(DEFAULT_NEARBY_LIMIT),
            )
            .await?)
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn derive_slug(&self, name: &str) -> Result<Slug, StoreError> {
        let base = Slug::from_name(name);
        let collisions = self.backend.count_slug_collisions(&base).await?;
        let slug = disambiguate(base, collisions);
        debug!(collisions, slug = %slug, "Derived slug");
        Ok(slug)
    }

    async fn find_document(
        &self,
        filter: StoreFilter,
    ) -> Result<Option<StoreDocument>, StoreError> {
        Ok(self.backend.find_stores(&filter).await?.into_iter().next())
    }

    async fn populate(&self, documents: Vec<StoreDocument>) -> Result<Vec<Store>, StoreError> {
        if documents.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<StoreId> = documents.iter().map(|d| d.id).collect();
        let mut reviews: HashMap<StoreId, Vec<Review>> = HashMap::new();
        for review in self.backend.reviews_for_stores(&ids).await? {
            reviews.entry(review.store).or_default().push(review);
        }

        Ok(documents
            .into_iter()
            .map(|d| {
                let joined = reviews.remove(&d.id).unwrap_or_default();
                d.populate(joined)
            })
            .collect())
    }
}
