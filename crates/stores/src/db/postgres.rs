//! `PostgreSQL` backend.
//!
//! Queries are checked at runtime (`sqlx::query_as`) and mapped through the
//! row types below. Coordinates are stored as two `DOUBLE PRECISION`
//! columns; the GiST index is built over `point(longitude, latitude)`.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::{debug, instrument};

use delicious_core::{GeoPoint, Rating, ReviewId, Slug, StoreId, UserId};

use super::{RepositoryError, StoreBackend};
use crate::models::{
    Location, NearbyStore, NewReview, NewUser, Review, StoreDocument, StoreFields, StoreFilter,
    StoreSearchHit, TagCount, TopStore, User,
};
use crate::slug::collision_pattern;

#[derive(Debug, FromRow)]
struct StoreRow {
    id: StoreId,
    name: String,
    slug: Slug,
    description: Option<String>,
    tags: Vec<String>,
    created_at: DateTime<Utc>,
    longitude: f64,
    latitude: f64,
    address: String,
    photo: Option<String>,
    author_id: UserId,
}

impl TryFrom<StoreRow> for StoreDocument {
    type Error = RepositoryError;

    fn try_from(row: StoreRow) -> Result<Self, Self::Error> {
        let point = GeoPoint::new(row.longitude, row.latitude).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid location for store {}: {e}", row.id))
        })?;

        Ok(Self {
            id: row.id,
            name: row.name,
            slug: row.slug,
            description: row.description,
            tags: row.tags,
            created: row.created_at,
            location: Location::new(point, row.address),
            photo: row.photo,
            author: row.author_id,
        })
    }
}

#[derive(Debug, FromRow)]
struct ReviewRow {
    id: ReviewId,
    store_id: StoreId,
    author_id: UserId,
    text: String,
    rating: Rating,
    created_at: DateTime<Utc>,
}

impl From<ReviewRow> for Review {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            store: row.store_id,
            author: row.author_id,
            text: row.text,
            rating: row.rating,
            created: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct UserRow {
    id: UserId,
    name: String,
    email: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            created: row.created_at,
        }
    }
}

#[derive(Debug, FromRow)]
struct TopStoreRow {
    #[sqlx(flatten)]
    store: StoreRow,
    average_rating: f64,
}

#[derive(Debug, FromRow)]
struct NearbyRow {
    id: StoreId,
    slug: Slug,
    name: String,
    description: Option<String>,
    longitude: f64,
    latitude: f64,
    address: String,
    photo: Option<String>,
    distance_m: f64,
}

fn sql_limit(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}

fn map_write_error(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_foreign_key_violation() {
            return RepositoryError::Conflict("referenced user does not exist".to_owned());
        }
        if db_err.is_unique_violation() {
            return RepositoryError::Conflict("email already exists".to_owned());
        }
        if db_err.is_check_violation() {
            return RepositoryError::Conflict(db_err.message().to_owned());
        }
    }
    RepositoryError::Database(e)
}

/// Backend over a `sqlx` connection pool.
#[derive(Debug, Clone)]
pub struct PgStoreBackend {
    pool: PgPool,
}

impl PgStoreBackend {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl StoreBackend for PgStoreBackend {
    #[instrument(skip(self), fields(base = %base))]
    async fn count_slug_collisions(&self, base: &Slug) -> Result<usize, RepositoryError> {
        let count: i64 = sqlx::query_scalar(
            r"
            SELECT COUNT(*)
            FROM delicious.store
            WHERE slug ~* $1
            ",
        )
        .bind(collision_pattern(base))
        .fetch_one(&self.pool)
        .await?;

        usize::try_from(count)
            .map_err(|_| RepositoryError::DataCorruption(format!("negative slug count {count}")))
    }

    #[instrument(skip(self, fields), fields(slug = %slug, author = %fields.author))]
    async fn insert_store(
        &self,
        fields: &StoreFields,
        slug: &Slug,
    ) -> Result<StoreDocument, RepositoryError> {
        let row: StoreRow = sqlx::query_as(
            r"
            INSERT INTO delicious.store
                (name, slug, description, tags, longitude, latitude, address, photo, author_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id, name, slug, description, tags, created_at,
                      longitude, latitude, address, photo, author_id
            ",
        )
        .bind(&fields.name)
        .bind(slug)
        .bind(&fields.description)
        .bind(&fields.tags)
        .bind(fields.location.coordinates.longitude())
        .bind(fields.location.coordinates.latitude())
        .bind(&fields.location.address)
        .bind(&fields.photo)
        .bind(fields.author)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        debug!(store_id = %row.id, "Inserted store");
        row.try_into()
    }

    #[instrument(skip(self, fields), fields(store_id = %id, slug = %slug))]
    async fn update_store(
        &self,
        id: StoreId,
        fields: &StoreFields,
        slug: &Slug,
    ) -> Result<Option<StoreDocument>, RepositoryError> {
        let row: Option<StoreRow> = sqlx::query_as(
            r"
            UPDATE delicious.store
            SET name = $2, slug = $3, description = $4, tags = $5,
                longitude = $6, latitude = $7, address = $8, photo = $9
            WHERE id = $1
            RETURNING id, name, slug, description, tags, created_at,
                      longitude, latitude, address, photo, author_id
            ",
        )
        .bind(id)
        .bind(&fields.name)
        .bind(slug)
        .bind(&fields.description)
        .bind(&fields.tags)
        .bind(fields.location.coordinates.longitude())
        .bind(fields.location.coordinates.latitude())
        .bind(&fields.location.address)
        .bind(&fields.photo)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_write_error)?;

        row.map(StoreDocument::try_from).transpose()
    }

    #[instrument(skip(self), fields(store_id = %id))]
    async fn delete_store(&self, id: StoreId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM delicious.store WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self))]
    async fn find_stores(
        &self,
        filter: &StoreFilter,
    ) -> Result<Vec<StoreDocument>, RepositoryError> {
        let rows: Vec<StoreRow> = sqlx::query_as(
            r"
            SELECT id, name, slug, description, tags, created_at,
                   longitude, latitude, address, photo, author_id
            FROM delicious.store
            WHERE ($1::int4 IS NULL OR id = $1)
              AND ($2::text IS NULL OR slug = $2)
              AND ($3::text IS NULL OR $3 = ANY(tags))
              AND ($4::int4 IS NULL OR author_id = $4)
            ORDER BY created_at DESC, id DESC
            OFFSET $5
            LIMIT $6
            ",
        )
        .bind(filter.id)
        .bind(filter.slug.as_ref())
        .bind(filter.tag.as_deref())
        .bind(filter.author)
        .bind(sql_limit(filter.skip))
        .bind(filter.limit.map(sql_limit))
        .fetch_all(&self.pool)
        .await?;

        debug!(count = rows.len(), "Loaded stores");
        rows.into_iter().map(StoreDocument::try_from).collect()
    }

    #[instrument(skip(self), fields(stores = stores.len()))]
    async fn reviews_for_stores(
        &self,
        stores: &[StoreId],
    ) -> Result<Vec<Review>, RepositoryError> {
        if stores.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = stores.iter().map(StoreId::as_i32).collect();

        let rows: Vec<ReviewRow> = sqlx::query_as(
            r"
            SELECT id, store_id, author_id, text, rating, created_at
            FROM delicious.review
            WHERE store_id = ANY($1)
            ORDER BY id ASC
            ",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Review::from).collect())
    }

    #[instrument(skip(self))]
    async fn tag_counts(&self) -> Result<Vec<TagCount>, RepositoryError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            r"
            SELECT tag, COUNT(*) AS count
            FROM delicious.store s
            CROSS JOIN LATERAL unnest(s.tags) AS tag
            GROUP BY tag
            ORDER BY count DESC, tag ASC
            ",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|(tag, count)| {
                let count = u64::try_from(count).map_err(|_| {
                    RepositoryError::DataCorruption(format!("negative count for tag {tag}"))
                })?;
                Ok(TagCount { tag, count })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn top_stores(
        &self,
        min_reviews: usize,
        limit: usize,
    ) -> Result<Vec<TopStore>, RepositoryError> {
        let rows: Vec<TopStoreRow> = sqlx::query_as(
            r"
            SELECT s.id, s.name, s.slug, s.description, s.tags, s.created_at,
                   s.longitude, s.latitude, s.address, s.photo, s.author_id,
                   AVG(r.rating)::float8 AS average_rating
            FROM delicious.store s
            JOIN delicious.review r ON r.store_id = s.id
            GROUP BY s.id
            HAVING COUNT(r.id) >= $1
            ORDER BY average_rating DESC, s.id ASC
            LIMIT $2
            ",
        )
        .bind(sql_limit(min_reviews))
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        let ids: Vec<StoreId> = rows.iter().map(|r| r.store.id).collect();
        let mut reviews: HashMap<StoreId, Vec<Review>> = HashMap::new();
        for review in self.reviews_for_stores(&ids).await? {
            reviews.entry(review.store).or_default().push(review);
        }

        rows.into_iter()
            .map(|row| {
                let store = StoreDocument::try_from(row.store)?;
                Ok(TopStore {
                    reviews: reviews.remove(&store.id).unwrap_or_default(),
                    store,
                    average_rating: row.average_rating,
                })
            })
            .collect()
    }

    #[instrument(skip(self))]
    async fn search_stores(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<StoreSearchHit>, RepositoryError> {
        if query.trim().is_empty() {
            return Ok(Vec::new());
        }

        // Any term may match; ts_rank orders stores matching more terms first.
        let hits: Vec<(StoreId, Slug, String, f64)> = sqlx::query_as(
            r"
            SELECT s.id, s.slug, s.name, ts_rank(document, terms)::float8 AS score
            FROM delicious.store s
            CROSS JOIN LATERAL
                to_tsvector('english', s.name || ' ' || coalesce(s.description, '')) AS document
            CROSS JOIN
                CAST(replace(plainto_tsquery('english', $1)::text, '&', '|') AS tsquery) AS terms
            WHERE document @@ terms
            ORDER BY score DESC, s.id ASC
            LIMIT $2
            ",
        )
        .bind(query)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        debug!(hits = hits.len(), "Search complete");
        Ok(hits
            .into_iter()
            .map(|(id, slug, name, score)| StoreSearchHit {
                id,
                slug,
                name,
                score,
            })
            .collect())
    }

    #[instrument(skip(self), fields(lng = origin.longitude(), lat = origin.latitude()))]
    async fn nearby_stores(
        &self,
        origin: GeoPoint,
        max_distance_m: f64,
        limit: usize,
    ) -> Result<Vec<NearbyStore>, RepositoryError> {
        // Haversine on a sphere of radius 6 378 100 m.
        let rows: Vec<NearbyRow> = sqlx::query_as(
            r"
            SELECT id, slug, name, description, longitude, latitude, address, photo, distance_m
            FROM (
                SELECT id, slug, name, description, longitude, latitude, address, photo,
                       2 * 6378100 * asin(least(1.0, sqrt(
                           power(sin(radians(latitude - $2::float8) / 2), 2)
                           + cos(radians($2::float8)) * cos(radians(latitude))
                             * power(sin(radians(longitude - $1::float8) / 2), 2)
                       ))) AS distance_m
                FROM delicious.store
            ) AS candidates
            WHERE distance_m <= $3
            ORDER BY distance_m ASC, id ASC
            LIMIT $4
            ",
        )
        .bind(origin.longitude())
        .bind(origin.latitude())
        .bind(max_distance_m)
        .bind(sql_limit(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                let point = GeoPoint::new(row.longitude, row.latitude).map_err(|e| {
                    RepositoryError::DataCorruption(format!(
                        "invalid location for store {}: {e}",
                        row.id
                    ))
                })?;
                Ok(NearbyStore {
                    id: row.id,
                    slug: row.slug,
                    name: row.name,
                    description: row.description,
                    location: Location::new(point, row.address),
                    photo: row.photo,
                    distance_m: row.distance_m,
                })
            })
            .collect()
    }

    #[instrument(skip(self, user))]
    async fn insert_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(
            r"
            INSERT INTO delicious.user (name, email)
            VALUES ($1, $2)
            RETURNING id, name, email, created_at
            ",
        )
        .bind(&user.name)
        .bind(&user.email)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        debug!(user_id = %row.id, "Inserted user");
        Ok(row.into())
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn user_exists(&self, id: UserId) -> Result<bool, RepositoryError> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM delicious.user WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    #[instrument(skip(self, review), fields(store_id = %review.store))]
    async fn insert_review(&self, review: &NewReview) -> Result<Review, RepositoryError> {
        let row: ReviewRow = sqlx::query_as(
            r"
            INSERT INTO delicious.review (store_id, author_id, text, rating)
            VALUES ($1, $2, $3, $4)
            RETURNING id, store_id, author_id, text, rating, created_at
            ",
        )
        .bind(review.store)
        .bind(review.author)
        .bind(&review.text)
        .bind(review.rating)
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(row.into())
    }
}
