//! UserDirectory port - ユーザー台帳への seam
//!
//! 認可判定（manager→reports の対応）はこの台帳の読み取りに依存するため、
//! read-your-writes が正しさの前提になる。

use std::collections::HashMap;

use async_trait::async_trait;

use crate::domain::{NewUser, Role, TaskError, User, UserId};

/// UserDirectory is the source of user records and the manager→reports
/// relation.
///
/// Contract:
/// - Reads have no side effects beyond caching.
/// - A user inserted in the same logical session must be visible to every
///   subsequent read (read-your-writes); authorization decisions are made
///   from these reads, so staleness here is a correctness bug, not a
///   performance concern.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, TaskError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, TaskError>;

    /// Every user in the directory.
    async fn all_users(&self) -> Result<Vec<User>, TaskError>;

    /// Insert a new user and return its assigned id.
    ///
    /// Username uniqueness is enforced here (`DuplicateUsername`). Role
    /// invariants are the service's job, not the directory's.
    async fn insert_user(&self, user: NewUser) -> Result<UserId, TaskError>;

    /// Direct END_USER reports grouped by their manager's id.
    ///
    /// Built by scanning all users, keeping END_USER rows with a manager and
    /// grouping by that manager. Order within a group is irrelevant, and the
    /// relation is deliberately non-transitive.
    async fn manager_to_reports_map(&self) -> Result<HashMap<UserId, Vec<User>>, TaskError> {
        let users = self.all_users().await?;
        let mut map: HashMap<UserId, Vec<User>> = HashMap::new();
        for user in users {
            if user.role == Role::EndUser
                && let Some(manager) = user.manager
            {
                map.entry(manager).or_default().push(user);
            }
        }
        Ok(map)
    }
}
