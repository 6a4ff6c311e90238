//! User domain types (store authors and reviewers).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use delicious_core::UserId;

/// A persisted user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub created: DateTime<Utc>,
}

/// A user submission.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInput {
    pub name: Option<String>,
    pub email: Option<String>,
}

/// Validated user fields ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    /// Lowercased.
    pub email: String,
}
