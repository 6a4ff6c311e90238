//! Store reports printed as JSON on stdout.

use serde::Serialize;
use tracing::info;

use delicious_core::GeoPoint;
use delicious_stores::StoreModel;

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<(), serde_json::Error> {
    let json = serde_json::to_string_pretty(value)?;
    #[allow(clippy::print_stdout)]
    {
        println!("{json}");
    }
    Ok(())
}

/// Print the tag histogram.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn tags(model: &StoreModel) -> Result<(), Box<dyn std::error::Error>> {
    let tags = model.get_tags_list().await?;
    info!(tags = tags.len(), "Tag histogram");
    print_json(&tags)?;
    Ok(())
}

/// Print the best-rated stores.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn top(model: &StoreModel) -> Result<(), Box<dyn std::error::Error>> {
    let stores = model.get_top_stores().await?;
    info!(stores = stores.len(), "Top stores");
    print_json(&stores)?;
    Ok(())
}

/// Print keyword search hits.
///
/// # Errors
///
/// Returns an error if the query fails.
pub async fn search(
    model: &StoreModel,
    query: &str,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let hits = model.search_stores(query, limit).await?;
    info!(query, hits = hits.len(), "Search results");
    print_json(&hits)?;
    Ok(())
}

/// Print stores near a point.
///
/// # Errors
///
/// Returns an error if the coordinates are out of range or the query fails.
pub async fn nearby(
    model: &StoreModel,
    lng: f64,
    lat: f64,
    max_distance: Option<f64>,
    limit: Option<usize>,
) -> Result<(), Box<dyn std::error::Error>> {
    let origin = GeoPoint::new(lng, lat)?;
    let stores = model.nearby_stores(origin, max_distance, limit).await?;
    info!(stores = stores.len(), "Nearby stores");
    print_json(&stores)?;
    Ok(())
}

/// Print a single store with its reviews.
///
/// # Errors
///
/// Returns an error if no store has this slug or the query fails.
pub async fn show(model: &StoreModel, slug: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = model
        .find_store_by_slug(slug)
        .await?
        .ok_or_else(|| format!("No store with slug '{slug}'"))?;
    print_json(&store)?;
    Ok(())
}
