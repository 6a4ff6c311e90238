//! Schema validation for store, review and user submissions.
//!
//! Validation is a pure step that runs before anything touches the database.
//! Every failing field is reported, not just the first one.

use thiserror::Error;

use delicious_core::{GeoError, GeoPoint, Rating};

use crate::models::{
    Location, NewReview, NewUser, ReviewInput, StoreFields, StoreInput, UserInput,
};

/// Field paths used in [`FieldError::field`].
pub mod fields {
    pub const NAME: &str = "name";
    pub const COORDINATES: &str = "location.coordinates";
    pub const ADDRESS: &str = "location.address";
    pub const AUTHOR: &str = "author";
    pub const STORE: &str = "store";
    pub const TEXT: &str = "text";
    pub const RATING: &str = "rating";
    pub const EMAIL: &str = "email";
}

/// User-facing validation messages.
pub mod messages {
    pub const NAME_REQUIRED: &str = "Please enter a store name!";
    pub const COORDINATES_REQUIRED: &str = "You must supply coordinates!";
    pub const COORDINATES_INVALID: &str =
        "Coordinates must be a [longitude, latitude] pair within range.";
    pub const ADDRESS_REQUIRED: &str = "You must supply address!";
    pub const AUTHOR_REQUIRED: &str = "You must supply an author.";

    pub const REVIEW_STORE_REQUIRED: &str = "You must supply a store!";
    pub const REVIEW_AUTHOR_REQUIRED: &str = "You must supply an author!";
    pub const REVIEW_TEXT_REQUIRED: &str = "Your review must have text!";
    pub const REVIEW_RATING_INVALID: &str = "Rating must be between 1 and 5!";

    pub const USER_NAME_REQUIRED: &str = "Please supply a name";
    pub const USER_EMAIL_INVALID: &str = "Invalid Email Address";
}

/// A single failed field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// All fields that failed validation for one submission.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("validation failed: {}", describe(.errors))]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

fn describe(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl ValidationErrors {
    /// The failed fields, in schema order.
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    /// The message for a field, if that field failed.
    #[must_use]
    pub fn message_for(&self, field: &str) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|e| e.field == field)
            .map(|e| e.message)
    }
}

#[derive(Default)]
struct Collector {
    errors: Vec<FieldError>,
}

impl Collector {
    fn fail(&mut self, field: &'static str, message: &'static str) {
        self.errors.push(FieldError { field, message });
    }

    fn finish(self) -> ValidationErrors {
        ValidationErrors {
            errors: self.errors,
        }
    }
}

/// Trim a string and drop it when nothing is left.
fn trimmed(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

/// Trim and validate a store submission.
///
/// `name` and `description` are trimmed first, so a whitespace-only name
/// counts as missing.
///
/// # Errors
///
/// Returns `ValidationErrors` listing every missing or malformed field.
pub fn validate_store(input: &StoreInput) -> Result<StoreFields, ValidationErrors> {
    let mut errors = Collector::default();

    let name = trimmed(input.name.as_deref());
    if name.is_none() {
        errors.fail(fields::NAME, messages::NAME_REQUIRED);
    }

    let location = input.location.as_ref();

    let coordinates = location.map_or(Err(GeoError::Missing), |l| {
        GeoPoint::from_coordinates(&l.coordinates)
    });
    match &coordinates {
        Ok(_) => {}
        Err(GeoError::Missing) => errors.fail(fields::COORDINATES, messages::COORDINATES_REQUIRED),
        Err(_) => errors.fail(fields::COORDINATES, messages::COORDINATES_INVALID),
    }

    let address = trimmed(location.and_then(|l| l.address.as_deref()));
    if address.is_none() {
        errors.fail(fields::ADDRESS, messages::ADDRESS_REQUIRED);
    }

    if input.author.is_none() {
        errors.fail(fields::AUTHOR, messages::AUTHOR_REQUIRED);
    }

    match (name, coordinates, address, input.author) {
        (Some(name), Ok(point), Some(address), Some(author)) => Ok(StoreFields {
            name,
            description: trimmed(input.description.as_deref()),
            tags: input.tags.clone(),
            location: Location::new(point, address),
            photo: input.photo.clone().filter(|p| !p.is_empty()),
            author,
        }),
        _ => Err(errors.finish()),
    }
}

/// Trim and validate a review submission.
///
/// # Errors
///
/// Returns `ValidationErrors` listing every missing or malformed field.
pub fn validate_review(input: &ReviewInput) -> Result<NewReview, ValidationErrors> {
    let mut errors = Collector::default();

    if input.store.is_none() {
        errors.fail(fields::STORE, messages::REVIEW_STORE_REQUIRED);
    }
    if input.author.is_none() {
        errors.fail(fields::AUTHOR, messages::REVIEW_AUTHOR_REQUIRED);
    }
    let text = trimmed(input.text.as_deref());
    if text.is_none() {
        errors.fail(fields::TEXT, messages::REVIEW_TEXT_REQUIRED);
    }
    let rating = input.rating.and_then(|r| Rating::new(r).ok());
    if rating.is_none() {
        errors.fail(fields::RATING, messages::REVIEW_RATING_INVALID);
    }

    match (input.store, input.author, text, rating) {
        (Some(store), Some(author), Some(text), Some(rating)) => Ok(NewReview {
            store,
            author,
            text,
            rating,
        }),
        _ => Err(errors.finish()),
    }
}

/// Trim and validate a user submission. The email is lowercased.
///
/// # Errors
///
/// Returns `ValidationErrors` listing every missing or malformed field.
pub fn validate_user(input: &UserInput) -> Result<NewUser, ValidationErrors> {
    let mut errors = Collector::default();

    let name = trimmed(input.name.as_deref());
    if name.is_none() {
        errors.fail(fields::NAME, messages::USER_NAME_REQUIRED);
    }

    let email = trimmed(input.email.as_deref())
        .map(|e| e.to_lowercase())
        .filter(|e| looks_like_email(e));
    if email.is_none() {
        errors.fail(fields::EMAIL, messages::USER_EMAIL_INVALID);
    }

    match (name, email) {
        (Some(name), Some(email)) => Ok(NewUser { name, email }),
        _ => Err(errors.finish()),
    }
}

fn looks_like_email(email: &str) -> bool {
    match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use delicious_core::{StoreId, UserId};

    use super::*;
    use crate::models::LocationInput;

    fn valid_input() -> StoreInput {
        StoreInput {
            name: Some("  Cafe Soul  ".to_owned()),
            description: Some("  Espresso bar \n".to_owned()),
            tags: vec!["Cafe".to_owned(), "Views".to_owned()],
            location: Some(LocationInput {
                coordinates: vec![-79.38, 43.65],
                address: Some("1 Queen St".to_owned()),
            }),
            photo: None,
            author: Some(UserId::new(1)),
        }
    }

    #[test]
    fn test_valid_store_is_trimmed() {
        let fields = validate_store(&valid_input()).unwrap();
        assert_eq!(fields.name, "Cafe Soul");
        assert_eq!(fields.description.as_deref(), Some("Espresso bar"));
        assert_eq!(fields.tags, vec!["Cafe", "Views"]);
        assert_eq!(fields.location.coordinates.coordinates(), [-79.38, 43.65]);
        assert_eq!(fields.author, UserId::new(1));
    }

    #[test]
    fn test_missing_name() {
        let input = StoreInput {
            name: None,
            ..valid_input()
        };
        let err = validate_store(&input).unwrap_err();
        assert_eq!(err.message_for(fields::NAME), Some("Please enter a store name!"));
        assert_eq!(err.errors().len(), 1);
    }

    #[test]
    fn test_whitespace_name_counts_as_missing() {
        let input = StoreInput {
            name: Some("   ".to_owned()),
            ..valid_input()
        };
        let err = validate_store(&input).unwrap_err();
        assert_eq!(err.message_for(fields::NAME), Some(messages::NAME_REQUIRED));
    }

    #[test]
    fn test_missing_coordinates() {
        let mut input = valid_input();
        input.location.as_mut().unwrap().coordinates.clear();
        let err = validate_store(&input).unwrap_err();
        assert_eq!(
            err.message_for(fields::COORDINATES),
            Some("You must supply coordinates!")
        );
    }

    #[test]
    fn test_malformed_coordinates() {
        let mut input = valid_input();
        input.location.as_mut().unwrap().coordinates = vec![-79.38, 143.65];
        let err = validate_store(&input).unwrap_err();
        assert_eq!(
            err.message_for(fields::COORDINATES),
            Some(messages::COORDINATES_INVALID)
        );

        input.location.as_mut().unwrap().coordinates = vec![1.0];
        assert!(validate_store(&input).is_err());
    }

    #[test]
    fn test_missing_address() {
        let mut input = valid_input();
        input.location.as_mut().unwrap().address = None;
        let err = validate_store(&input).unwrap_err();
        assert_eq!(
            err.message_for(fields::ADDRESS),
            Some("You must supply address!")
        );
    }

    #[test]
    fn test_missing_location_reports_both_parts() {
        let input = StoreInput {
            location: None,
            ..valid_input()
        };
        let err = validate_store(&input).unwrap_err();
        assert_eq!(
            err.message_for(fields::COORDINATES),
            Some(messages::COORDINATES_REQUIRED)
        );
        assert_eq!(err.message_for(fields::ADDRESS), Some(messages::ADDRESS_REQUIRED));
    }

    #[test]
    fn test_missing_author() {
        let input = StoreInput {
            author: None,
            ..valid_input()
        };
        let err = validate_store(&input).unwrap_err();
        assert_eq!(
            err.message_for(fields::AUTHOR),
            Some("You must supply an author.")
        );
    }

    #[test]
    fn test_empty_input_reports_every_required_field_in_order() {
        let err = validate_store(&StoreInput::default()).unwrap_err();
        let failed: Vec<_> = err.errors().iter().map(|e| e.field).collect();
        assert_eq!(
            failed,
            vec![fields::NAME, fields::COORDINATES, fields::ADDRESS, fields::AUTHOR]
        );
        assert_eq!(
            err.to_string(),
            "validation failed: name: Please enter a store name!; \
             location.coordinates: You must supply coordinates!; \
             location.address: You must supply address!; \
             author: You must supply an author."
        );
    }

    #[test]
    fn test_blank_description_becomes_none() {
        let input = StoreInput {
            description: Some("   ".to_owned()),
            ..valid_input()
        };
        assert_eq!(validate_store(&input).unwrap().description, None);
    }

    #[test]
    fn test_review_validation() {
        let review = validate_review(&ReviewInput {
            store: Some(StoreId::new(1)),
            author: Some(UserId::new(2)),
            text: Some(" Great coffee ".to_owned()),
            rating: Some(5),
        })
        .unwrap();
        assert_eq!(review.text, "Great coffee");
        assert_eq!(review.rating.stars(), 5);

        let err = validate_review(&ReviewInput {
            rating: Some(6),
            ..ReviewInput::default()
        })
        .unwrap_err();
        assert_eq!(err.errors().len(), 4);
        assert_eq!(
            err.message_for(fields::RATING),
            Some(messages::REVIEW_RATING_INVALID)
        );
    }

    #[test]
    fn test_user_validation() {
        let user = validate_user(&UserInput {
            name: Some("Wes".to_owned()),
            email: Some(" Wes@Example.com ".to_owned()),
        })
        .unwrap();
        assert_eq!(user.email, "wes@example.com");

        let err = validate_user(&UserInput {
            name: None,
            email: Some("not-an-email".to_owned()),
        })
        .unwrap_err();
        assert_eq!(err.message_for(fields::NAME), Some(messages::USER_NAME_REQUIRED));
        assert_eq!(err.message_for(fields::EMAIL), Some(messages::USER_EMAIL_INVALID));
    }
}
