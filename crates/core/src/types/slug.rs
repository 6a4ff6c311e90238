//! URL slugs derived from human-readable store names.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Slug used when a name contains no letters or digits at all.
const FALLBACK_SLUG: &str = "store";

/// Turn a human-readable name into a URL-safe slug.
///
/// Letters and digits are lowercased and kept; apostrophes are dropped so
/// possessives stay readable; every other run of characters (whitespace,
/// punctuation, symbols) collapses into a single `-`. Leading and trailing
/// separators are trimmed.
///
/// ```
/// use delicious_core::slugify;
///
/// assert_eq!(slugify("Cafe Soul"), "cafe-soul");
/// assert_eq!(slugify("  Bob's  Burgers & Fries!! "), "bobs-burgers-fries");
/// assert_eq!(slugify("!!!"), "");
/// ```
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut pending_separator = false;

    for c in name.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !slug.is_empty() {
                slug.push('-');
            }
            pending_separator = false;
            slug.extend(c.to_lowercase());
        } else if c == '\'' || c == '\u{2019}' {
            // dropped, not a word break
        } else {
            pending_separator = true;
        }
    }

    slug
}

/// A URL-safe, lowercase, hyphenated store identifier.
///
/// Slugs are derived from names with [`Slug::from_name`] and disambiguated
/// with [`Slug::with_suffix`]. They are not guaranteed unique: the store
/// model derives them with a non-transactional check-then-set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive the base slug for a store name.
    ///
    /// Names without any letters or digits fall back to `"store"`.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let slug = slugify(name);
        if slug.is_empty() {
            Self(FALLBACK_SLUG.to_owned())
        } else {
            Self(slug)
        }
    }

    /// Wrap an already-stored slug without re-slugifying it.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Append a numeric disambiguation suffix (`cafe-soul` -> `cafe-soul-2`).
    #[must_use]
    pub fn with_suffix(&self, n: usize) -> Self {
        Self(format!("{}-{n}", self.0))
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Slug` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Slug {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Slug {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Slug {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}
