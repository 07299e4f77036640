//! User model and the owner–manager hierarchy.

use serde::{Deserialize, Serialize};

use super::ids::UserId;

/// Role of a directory user.
///
/// We intentionally serialize as SCREAMING_SNAKE_CASE to match the wire
/// format: END_USER / MANAGER / ADMIN.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    EndUser,
    Manager,
    Admin,
}

/// A directory user.
///
/// `manager` is a weak reference by id. Invariant (enforced on directory
/// insert, see `service::users`): an END_USER must reference a manager whose
/// role is MANAGER; MANAGER and ADMIN rows may have none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub username: String,

    /// Opaque to the core: hashing and verification happen in the
    /// caller-facing layer.
    pub password_hash: String,

    pub email: String,
    pub role: Role,
    pub manager: Option<UserId>,
}

/// Input for a directory insert. The id is assigned by the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub password_hash: String,
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub manager: Option<UserId>,
}

impl NewUser {
    /// Attach the directory-assigned id, producing the stored record.
    pub fn into_user(self, user_id: UserId) -> User {
        User {
            user_id,
            username: self.username,
            password_hash: self.password_hash,
            email: self.email,
            role: self.role,
            manager: self.manager,
        }
    }
}
