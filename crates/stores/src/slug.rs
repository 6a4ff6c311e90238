//! Slug disambiguation.
//!
//! A new slug is the slugified name, suffixed with `-{n}` when other stores
//! already use that base. "Other stores" means every slug matching
//! `^(base)((-[0-9]*$)?)$` case-insensitively, i.e. the base itself or the
//! base followed by a numeric suffix.

use delicious_core::Slug;

/// Regex (shared by the `PostgreSQL` `~*` operator and the in-memory backend)
/// selecting slugs that collide with `base`.
#[must_use]
pub fn collision_pattern(base: &Slug) -> String {
    format!("^({})((-[0-9]*$)?)$", regex::escape(base.as_str()))
}

/// Pick the slug for a store given how many existing slugs collide with
/// `base`.
#[must_use]
pub fn disambiguate(base: Slug, collisions: usize) -> Slug {
    if collisions == 0 {
        base
    } else {
        base.with_suffix(collisions + 1)
    }
}
