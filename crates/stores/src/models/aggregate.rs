//! Result shapes of the aggregate and index-backed queries.

use serde::{Deserialize, Serialize};

use delicious_core::{Slug, StoreId};

use super::review::Review;
use super::store::{Location, StoreDocument};

/// How many stores carry a tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagCount {
    pub tag: String,
    pub count: u64,
}

/// A store ranked by the mean rating of its reviews.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopStore {
    #[serde(flatten)]
    pub store: StoreDocument,
    pub reviews: Vec<Review>,
    #[serde(rename = "averageRating")]
    pub average_rating: f64,
}

/// A keyword search match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreSearchHit {
    pub id: StoreId,
    pub slug: Slug,
    pub name: String,
    /// Relevance; higher is better. Only comparable within one result set.
    pub score: f64,
}

/// A store near a point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyStore {
    pub id: StoreId,
    pub slug: Slug,
    pub name: String,
    pub description: Option<String>,
    pub location: Location,
    pub photo: Option<String>,
    /// Great-circle distance from the query point, in meters.
    pub distance_m: f64,
}
