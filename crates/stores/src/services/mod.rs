//! Business logic services for the store model.
//!
//! # Services
//!
//! - `stores` - Store lifecycle hooks (validation, slug derivation, review
//!   population) and the aggregate queries

pub mod stores;

pub use stores::{
    DEFAULT_NEARBY_DISTANCE_METERS, DEFAULT_NEARBY_LIMIT, DEFAULT_SEARCH_LIMIT, StoreModel,
};
