//! User domain entity and related types.

use serde::{Deserialize, Serialize};

/// User domain entity.
///
/// `id` is assigned by the store on insert and never changes afterwards.
/// `email` is unique across all users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct User {
    /// Store-assigned identifier
    pub id: i64,
    /// Display name
    pub name: String,
    /// Email address
    pub email: String,
}

impl User {
    /// Create a user record from its parts
    pub fn new(id: i64, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            email: email.into(),
        }
    }

    /// Check whether `email` differs from the current address
    pub fn email_changes_to(&self, email: &str) -> bool {
        self.email != email
    }

    /// Overwrite name and email with the given data.
    pub fn apply(&mut self, data: UserData) {
        self.name = data.name;
        self.email = data.email;
    }
}

/// Mutable user fields, used for both creation and full updates.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserData {
    /// User display name
    pub name: String,
    /// User email address
    pub email: String,
}

impl UserData {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}
