//! Review domain types.
//!
//! Reviews belong to the surrounding application; the store model only
//! needs enough of them to populate `reviews` and rank top stores.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use delicious_core::{Rating, ReviewId, StoreId, UserId};

/// A persisted review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    /// Store being reviewed (the reverse side of `Store.reviews`).
    pub store: StoreId,
    pub author: UserId,
    pub text: String,
    pub rating: Rating,
    pub created: DateTime<Utc>,
}

/// A review submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewInput {
    pub store: Option<StoreId>,
    pub author: Option<UserId>,
    pub text: Option<String>,
    pub rating: Option<i64>,
}

/// Validated review fields ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReview {
    pub store: StoreId,
    pub author: UserId,
    pub text: String,
    pub rating: Rating,
}
