//! Store model behavior against `PostgreSQL`.
//!
//! These tests require:
//! - A running `PostgreSQL` database
//! - `DELICIOUS_DATABASE_URL` (or `DATABASE_URL`) pointing at it
//!
//! The `delicious` tables are truncated before each test.
//!
//! Run with: cargo test -p delicious-integration-tests --test postgres_store_model -- --ignored

#![allow(clippy::unwrap_used)]

use delicious_core::GeoPoint;
use delicious_integration_tests::{
    create_author, postgres_lock, postgres_model, review_input, store_input,
};
use delicious_stores::db::RepositoryError;
use delicious_stores::models::{StoreFilter, StoreUpdate};
use delicious_stores::validation::{fields, messages};
use delicious_stores::StoreError;

const QUEEN_ST: [f64; 2] = [-79.3832, 43.6532];

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database (DELICIOUS_DATABASE_URL)"]
async fn test_slugs_and_update() {
    let _guard = postgres_lock().await;
    let model = postgres_model().await.unwrap();
    let author = create_author(&model, "Wes").await.unwrap();

    let mut slugs = Vec::new();
    for name in ["Cafe Soul", "CAFE SOUL", "Cafe Soul"] {
        let store = model
            .create_store(store_input(name, author, &["Cafe"], QUEEN_ST))
            .await
            .unwrap();
        slugs.push(store.slug().to_string());
    }
    assert_eq!(slugs, ["cafe-soul", "cafe-soul-2", "cafe-soul-3"]);

    let store = model.find_store_by_slug("cafe-soul-2").await.unwrap().unwrap();
    let updated = model
        .update_store(
            store.id(),
            StoreUpdate {
                description: Some("Second location".to_owned()),
                ..StoreUpdate::default()
            },
        )
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.slug().as_str(), "cafe-soul-2");
    assert_eq!(
        updated.document.description.as_deref(),
        Some("Second location")
    );
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database (DELICIOUS_DATABASE_URL)"]
async fn test_validation_and_references() {
    let _guard = postgres_lock().await;
    let model = postgres_model().await.unwrap();
    let author = create_author(&model, "Wes").await.unwrap();

    let mut missing = store_input("Cafe Soul", author, &[], QUEEN_ST);
    missing.location = None;
    let err = model.create_store(missing).await.unwrap_err();
    let errors = err.validation().unwrap();
    assert_eq!(
        errors.message_for(fields::COORDINATES),
        Some(messages::COORDINATES_REQUIRED)
    );
    assert_eq!(
        errors.message_for(fields::ADDRESS),
        Some(messages::ADDRESS_REQUIRED)
    );

    let err = create_author(&model, "Wes").await.unwrap_err();
    assert!(matches!(
        err,
        StoreError::Repository(RepositoryError::Conflict(_))
    ));
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database (DELICIOUS_DATABASE_URL)"]
async fn test_tags_top_and_population() {
    let _guard = postgres_lock().await;
    let model = postgres_model().await.unwrap();
    let author = create_author(&model, "Wes").await.unwrap();

    let mut ids = Vec::new();
    for (name, tags) in [
        ("One", &["Views", "Cafe"][..]),
        ("Two", &["Views"][..]),
        ("Three", &["Cafe", "Views"][..]),
    ] {
        let store = model
            .create_store(store_input(name, author, tags, QUEEN_ST))
            .await
            .unwrap();
        ids.push(store.id());
    }

    let tags = model.get_tags_list().await.unwrap();
    let pairs: Vec<(&str, u64)> = tags.iter().map(|t| (t.tag.as_str(), t.count)).collect();
    assert_eq!(pairs, [("Views", 3), ("Cafe", 2)]);

    model.create_review(review_input(ids[0], author, 5)).await.unwrap();
    model.create_review(review_input(ids[1], author, 4)).await.unwrap();
    model.create_review(review_input(ids[1], author, 5)).await.unwrap();

    let top = model.get_top_stores().await.unwrap();
    assert_eq!(top.len(), 1);
    assert_eq!(top[0].store.id, ids[1]);
    assert_eq!(top[0].reviews.len(), 2);
    assert!((top[0].average_rating - 4.5).abs() < 1e-9);

    let stores = model.stores_by_tag("Cafe").await.unwrap();
    assert_eq!(stores.len(), 2);
    let one = stores.iter().find(|s| s.id() == ids[0]).unwrap();
    assert_eq!(one.reviews.len(), 1);

    assert!(model.delete_store(ids[1]).await.unwrap());
    let orphans = model.reviews_for_store(ids[1]).await.unwrap();
    assert_eq!(orphans.len(), 2);

    let page = model
        .find_stores(&StoreFilter::default().paginate(0, 1))
        .await
        .unwrap();
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].id(), ids[2]);
}

#[tokio::test]
#[ignore = "Requires a running PostgreSQL database (DELICIOUS_DATABASE_URL)"]
async fn test_search_and_nearby() {
    let _guard = postgres_lock().await;
    let model = postgres_model().await.unwrap();
    let author = create_author(&model, "Wes").await.unwrap();

    let mut coffee = store_input("Bean There", author, &[], QUEEN_ST);
    coffee.description = Some("Coffee and bagels".to_owned());
    model.create_store(coffee).await.unwrap();
    let mut bagels = store_input("Bagel Hut", author, &[], [-79.4005, 43.6547]);
    bagels.description = Some("Just bagels".to_owned());
    model.create_store(bagels).await.unwrap();
    model
        .create_store(store_input("Lookout", author, &[], [-75.6972, 45.4215]))
        .await
        .unwrap();

    let hits = model.search_stores("coffee bagels", None).await.unwrap();
    let names: Vec<&str> = hits.iter().map(|h| h.name.as_str()).collect();
    assert_eq!(names, ["Bean There", "Bagel Hut"]);
    assert!(hits[0].score > hits[1].score);

    let origin = GeoPoint::new(-79.3840, 43.6535).unwrap();
    let nearby = model.nearby_stores(origin, None, None).await.unwrap();
    let names: Vec<&str> = nearby.iter().map(|n| n.name.as_str()).collect();
    assert_eq!(names, ["Bean There", "Bagel Hut"]);
    assert!(nearby[0].distance_m < nearby[1].distance_m);
}
