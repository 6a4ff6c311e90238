//! In-process aggregations.
//!
//! These mirror the database-side queries step by step so that backends
//! without an aggregation engine produce identical results.

use std::cmp::Ordering;
use std::collections::HashMap;

use delicious_core::StoreId;

use crate::models::{Review, StoreDocument, TagCount, TopStore};

/// Minimum number of reviews for a store to be ranked.
pub const TOP_STORES_MIN_REVIEWS: usize = 2;

/// Maximum number of ranked stores returned.
pub const TOP_STORES_LIMIT: usize = 10;

/// Count tags across stores.
///
/// Steps: flatten every store's tags into (store, tag) pairs, group by tag,
/// count, sort by count descending. A tag repeated within one store counts
/// once per occurrence. Equal counts are ordered by tag name.
pub fn tag_counts<'a>(stores: impl IntoIterator<Item = &'a StoreDocument>) -> Vec<TagCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for tag in stores.into_iter().flat_map(|s| s.tags.iter()) {
        *counts.entry(tag.as_str()).or_insert(0) += 1;
    }

    let mut list: Vec<TagCount> = counts
        .into_iter()
        .map(|(tag, count)| TagCount {
            tag: tag.to_owned(),
            count,
        })
        .collect();
    list.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    list
}

/// Arithmetic mean of the ratings, `None` when there are no reviews.
#[must_use]
pub fn average_rating(reviews: &[Review]) -> Option<f64> {
    if reviews.is_empty() {
        return None;
    }
    let total: u32 = reviews.iter().map(|r| u32::from(r.rating.stars())).sum();
    #[allow(clippy::cast_precision_loss)] // review counts never approach 2^52
    let count = reviews.len() as f64;
    Some(f64::from(total) / count)
}

/// Rank stores by mean review rating.
///
/// Steps: join each store with the reviews pointing at it, keep stores with
/// at least `min_reviews`, compute the mean rating, sort descending, keep
/// the first `limit`. Stores below the threshold are dropped, not given a
/// default average. Equal averages keep the input order of `stores`.
pub fn top_stores(
    stores: &[StoreDocument],
    reviews: &[Review],
    min_reviews: usize,
    limit: usize,
) -> Vec<TopStore> {
    let mut by_store: HashMap<StoreId, Vec<Review>> = HashMap::new();
    for review in reviews {
        by_store.entry(review.store).or_default().push(review.clone());
    }

    let mut ranked: Vec<TopStore> = stores
        .iter()
        .filter_map(|store| {
            let joined = by_store.remove(&store.id)?;
            if joined.len() < min_reviews {
                return None;
            }
            let average_rating = average_rating(&joined)?;
            Some(TopStore {
                store: store.clone(),
                reviews: joined,
                average_rating,
            })
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.average_rating
            .partial_cmp(&a.average_rating)
            .unwrap_or(Ordering::Equal)
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;
    use delicious_core::{GeoPoint, Rating, ReviewId, Slug, UserId};

    use super::*;
    use crate::models::Location;

    fn store(id: i32, tags: &[&str]) -> StoreDocument {
        StoreDocument {
            id: StoreId::new(id),
            name: format!("Store {id}"),
            slug: Slug::from_name(&format!("Store {id}")),
            description: None,
            tags: tags.iter().map(|t| (*t).to_owned()).collect(),
            created: Utc::now(),
            location: Location::new(GeoPoint::new(0.0, 0.0).unwrap(), "Somewhere"),
            photo: None,
            author: UserId::new(1),
        }
    }

    fn review(id: i32, store: i32, rating: i64) -> Review {
        Review {
            id: ReviewId::new(id),
            store: StoreId::new(store),
            author: UserId::new(1),
            text: "ok".to_owned(),
            rating: Rating::new(rating).unwrap(),
            created: Utc::now(),
        }
    }

    #[test]
    fn test_tag_counts_sorted_by_count() {
        let stores = vec![
            store(1, &["Views", "Cafe"]),
            store(2, &["Views"]),
            store(3, &["Cafe", "Views"]),
        ];
        let counts = tag_counts(&stores);
        assert_eq!(
            counts,
            vec![
                TagCount {
                    tag: "Views".to_owned(),
                    count: 3
                },
                TagCount {
                    tag: "Cafe".to_owned(),
                    count: 2
                },
            ]
        );
    }

    #[test]
    fn test_tag_counts_empty() {
        assert!(tag_counts(std::iter::empty()).is_empty());
    }

    #[test]
    fn test_tag_counts_duplicate_tag_in_one_store_counts_twice() {
        let stores = vec![store(1, &["Wifi", "Wifi"])];
        assert_eq!(tag_counts(&stores)[0].count, 2);
    }

    #[test]
    fn test_average_rating() {
        assert_eq!(average_rating(&[]), None);
        let reviews = vec![review(1, 1, 4), review(2, 1, 5)];
        assert!((average_rating(&reviews).unwrap() - 4.5).abs() < f64::EPSILON);
    }

    #[test]
    fn test_top_stores_requires_two_reviews() {
        let stores = vec![store(1, &[]), store(2, &[]), store(3, &[])];
        let reviews = vec![
            review(1, 1, 5),
            review(2, 2, 4),
            review(3, 2, 5),
        ];

        let top = top_stores(&stores, &reviews, TOP_STORES_MIN_REVIEWS, TOP_STORES_LIMIT);
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].store.id, StoreId::new(2));
        assert!((top[0].average_rating - 4.5).abs() < f64::EPSILON);
        assert_eq!(top[0].reviews.len(), 2);
    }

    #[test]
    fn test_top_stores_sorted_and_capped() {
        let stores: Vec<_> = (1..=12).map(|id| store(id, &[])).collect();
        let mut reviews = Vec::new();
        let mut next = 0;
        for id in 1..=12 {
            // averages climb from 1.0 (store 1) to 3.0 (store 5 onwards)
            let high = i64::from(id).min(5);
            for rating in [1, high] {
                next += 1;
                reviews.push(review(next, id, rating));
            }
        }

        let top = top_stores(&stores, &reviews, TOP_STORES_MIN_REVIEWS, TOP_STORES_LIMIT);
        assert_eq!(top.len(), 10);
        assert!(
            top.windows(2)
                .all(|w| w[0].average_rating >= w[1].average_rating)
        );
        assert!((top[0].average_rating - 3.0).abs() < f64::EPSILON);
        assert!(top.iter().all(|t| t.store.id != StoreId::new(1)));
    }
}
