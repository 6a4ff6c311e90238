//! Store model error types.

use thiserror::Error;

use delicious_core::{StoreId, UserId};

use crate::db::RepositoryError;
use crate::validation::ValidationErrors;

/// Errors returned by [`crate::services::StoreModel`].
#[derive(Debug, Error)]
pub enum StoreError {
    /// One or more fields failed validation; nothing was written.
    #[error(transparent)]
    Validation(#[from] ValidationErrors),

    /// The referenced author does not exist.
    #[error("user {0} does not exist")]
    UnknownAuthor(UserId),

    /// The referenced store does not exist.
    #[error("store {0} does not exist")]
    UnknownStore(StoreId),

    /// The backend failed.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl StoreError {
    /// Validation failures, if this is a validation error.
    #[must_use]
    pub const fn validation(&self) -> Option<&ValidationErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}
