//! UserService - ユーザー台帳操作
//!
//! END_USER の役割不変条件（MANAGER を上長に持つこと）はここで強制する。
//! 台帳そのものは username の一意性だけを見る。

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::{NewUser, Role, TaskError, User, UserId};
use crate::ports::UserDirectory;

/// Directory operations: inserts with the role invariant, lookups, and the
/// admin bootstrap.
pub struct UserService {
    directory: Arc<dyn UserDirectory>,
}

impl UserService {
    pub fn new(directory: Arc<dyn UserDirectory>) -> Self {
        Self { directory }
    }

    /// Insert a user.
    ///
    /// Invariant: an END_USER must reference a manager whose role is MANAGER;
    /// MANAGER and ADMIN need none. Passwords arrive pre-hashed — hashing
    /// mechanics live in the caller-facing layer.
    pub async fn insert_user(&self, user: NewUser) -> Result<UserId, TaskError> {
        if user.role == Role::EndUser && !self.has_managing_manager(&user).await? {
            warn!(username = %user.username, "end user rejected: no MANAGER manager");
            return Err(TaskError::EndUserWithoutManager(user.username));
        }

        let username = user.username.clone();
        let id = self.directory.insert_user(user).await?;
        info!(user_id = %id, username = %username, "user created");
        Ok(id)
    }

    pub async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, TaskError> {
        self.directory.find_by_id(user_id).await
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>, TaskError> {
        self.directory.find_by_username(username).await
    }

    /// Resolve an actor by username, failing with `UnknownUser` — the seam a
    /// transport layer uses to turn a session principal into an actor.
    pub async fn require_by_username(&self, username: &str) -> Result<User, TaskError> {
        self.directory
            .find_by_username(username)
            .await?
            .ok_or_else(|| TaskError::UnknownUser(username.to_string()))
    }

    pub async fn all_users(&self) -> Result<Vec<User>, TaskError> {
        self.directory.all_users().await
    }

    pub async fn manager_to_reports_map(&self) -> Result<HashMap<UserId, Vec<User>>, TaskError> {
        self.directory.manager_to_reports_map().await
    }

    /// Ensure an ADMIN exists, creating the bootstrap admin if there is none.
    /// Idempotent: returns the existing admin's id on later calls.
    pub async fn initialize_admin_user(
        &self,
        password_hash: impl Into<String>,
    ) -> Result<UserId, TaskError> {
        let users = self.directory.all_users().await?;
        if let Some(admin) = users.into_iter().find(|user| user.role == Role::Admin) {
            return Ok(admin.user_id);
        }

        let id = self
            .directory
            .insert_user(NewUser {
                username: "admin".to_string(),
                password_hash: password_hash.into(),
                email: "admin@example.com".to_string(),
                role: Role::Admin,
                manager: None,
            })
            .await?;
        info!(user_id = %id, "bootstrap admin created");
        Ok(id)
    }

    async fn has_managing_manager(&self, user: &NewUser) -> Result<bool, TaskError> {
        let Some(manager_id) = user.manager else {
            return Ok(false);
        };
        Ok(self
            .directory
            .find_by_id(manager_id)
            .await?
            .is_some_and(|manager| manager.role == Role::Manager))
    }
}
