//! Core types for Delicious.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod geo;
pub mod id;
pub mod rating;
pub mod slug;

pub use geo::{GeoError, GeoPoint};
pub use id::*;
pub use rating::{Rating, RatingError};
pub use slug::{Slug, slugify};
