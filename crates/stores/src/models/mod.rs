//! Domain models for the store model and the entities it references.

pub mod aggregate;
pub mod review;
pub mod store;
pub mod user;

pub use aggregate::{NearbyStore, StoreSearchHit, TagCount, TopStore};
pub use review::{NewReview, Review, ReviewInput};
pub use store::{
    GeometryKind, Location, LocationInput, Store, StoreDocument, StoreFields, StoreFilter,
    StoreInput, StoreUpdate,
};
pub use user::{NewUser, User, UserInput};
