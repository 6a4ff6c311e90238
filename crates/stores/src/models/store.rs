//! Store domain types.
//!
//! Three shapes of the same entity:
//!
//! - [`StoreInput`] / [`StoreUpdate`] - what callers submit. No `id`, `slug`,
//!   `created` or `reviews`: those are system-assigned or computed, and any
//!   such keys in submitted JSON are ignored.
//! - [`StoreDocument`] - what the database persists.
//! - [`Store`] - a document with its `reviews` populated, as every read
//!   through the store model returns it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use delicious_core::{GeoPoint, Slug, StoreId, UserId};

use super::review::Review;

/// GeoJSON geometry type of a store location. Only points are supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GeometryKind {
    #[default]
    Point,
}

/// A validated store location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    /// Always `"Point"`.
    #[serde(rename = "type", default)]
    pub kind: GeometryKind,
    /// `[longitude, latitude]`.
    pub coordinates: GeoPoint,
    /// Street address.
    pub address: String,
}

impl Location {
    /// Create a point location.
    #[must_use]
    pub fn new(coordinates: GeoPoint, address: impl Into<String>) -> Self {
        Self {
            kind: GeometryKind::Point,
            coordinates,
            address: address.into(),
        }
    }
}

/// Location as submitted; either part may be missing until validated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocationInput {
    /// Raw coordinate sequence, expected `[longitude, latitude]`.
    pub coordinates: Vec<f64>,
    /// Street address.
    pub address: Option<String>,
}

impl From<&Location> for LocationInput {
    fn from(location: &Location) -> Self {
        Self {
            coordinates: location.coordinates.coordinates().to_vec(),
            address: Some(location.address.clone()),
        }
    }
}

/// A store submission.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreInput {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub location: Option<LocationInput>,
    pub photo: Option<String>,
    pub author: Option<UserId>,
}

/// A partial edit of a store's editable fields. `None` leaves a field as is.
///
/// The author is an ownership reference and cannot be changed here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub tags: Option<Vec<String>>,
    pub location: Option<LocationInput>,
    pub photo: Option<String>,
}

impl StoreUpdate {
    /// Overlay this update on an existing document, producing a full input
    /// that can be validated again.
    #[must_use]
    pub fn apply_to(self, current: &StoreDocument) -> StoreInput {
        StoreInput {
            name: Some(self.name.unwrap_or_else(|| current.name.clone())),
            description: self.description.or_else(|| current.description.clone()),
            tags: self.tags.unwrap_or_else(|| current.tags.clone()),
            location: Some(
                self.location
                    .unwrap_or_else(|| LocationInput::from(&current.location)),
            ),
            photo: self.photo.or_else(|| current.photo.clone()),
            author: Some(current.author),
        }
    }
}

/// Validated, trimmed store fields ready to be written.
///
/// Produced only by [`crate::validation::validate_store`].
#[derive(Debug, Clone, PartialEq)]
pub struct StoreFields {
    pub name: String,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub location: Location,
    pub photo: Option<String>,
    pub author: UserId,
}

/// A persisted store, without virtual fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreDocument {
    pub id: StoreId,
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    pub location: Location,
    pub photo: Option<String>,
    pub author: UserId,
}

impl StoreDocument {
    /// Attach the reviews that reference this store.
    #[must_use]
    pub fn populate(self, reviews: Vec<Review>) -> Store {
        Store {
            document: self,
            reviews,
        }
    }
}

/// A store with its `reviews` virtual materialized.
///
/// Serializes flat: the document fields plus a `reviews` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Store {
    #[serde(flatten)]
    pub document: StoreDocument,
    pub reviews: Vec<Review>,
}

impl Store {
    #[must_use]
    pub const fn id(&self) -> StoreId {
        self.document.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.document.name
    }

    #[must_use]
    pub const fn slug(&self) -> &Slug {
        &self.document.slug
    }
}

/// Criteria for listing stores. All set criteria must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreFilter {
    pub id: Option<StoreId>,
    pub slug: Option<Slug>,
    pub tag: Option<String>,
    pub author: Option<UserId>,
    pub skip: usize,
    pub limit: Option<usize>,
}

impl StoreFilter {
    #[must_use]
    pub fn by_id(id: StoreId) -> Self {
        Self {
            id: Some(id),
            limit: Some(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn by_slug(slug: Slug) -> Self {
        Self {
            slug: Some(slug),
            limit: Some(1),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[must_use]
    pub const fn with_author(mut self, author: UserId) -> Self {
        self.author = Some(author);
        self
    }

    #[must_use]
    pub const fn paginate(mut self, skip: usize, limit: usize) -> Self {
        self.skip = skip;
        self.limit = Some(limit);
        self
    }

    /// Whether a document satisfies every criterion except pagination.
    #[must_use]
    pub fn matches(&self, store: &StoreDocument) -> bool {
        self.id.is_none_or(|id| store.id == id)
            && self.slug.as_ref().is_none_or(|slug| &store.slug == slug)
            && self
                .tag
                .as_ref()
                .is_none_or(|tag| store.tags.iter().any(|t| t == tag))
            && self.author.is_none_or(|author| store.author == author)
    }
}
