//! In-memory user directory (backing table).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::debug;

use crate::domain::{NewUser, TaskError, User, UserId};
use crate::ports::{IdGenerator, UserDirectory};

/// In-memory `UserDirectory` (development and tests).
///
/// Design:
/// - `users` is the single source of truth.
/// - Username uniqueness is enforced here, inside the critical section.
pub struct InMemoryUserDirectory {
    users: Mutex<HashMap<UserId, User>>,
    ids: Arc<dyn IdGenerator>,
}

impl InMemoryUserDirectory {
    pub fn new(ids: Arc<dyn IdGenerator>) -> Self {
        Self {
            users: Mutex::new(HashMap::new()),
            ids,
        }
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, TaskError> {
        let users = self.users.lock().await;
        Ok(users.get(&user_id).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, TaskError> {
        let users = self.users.lock().await;
        Ok(users.values().find(|user| user.username == username).cloned())
    }

    async fn all_users(&self) -> Result<Vec<User>, TaskError> {
        let users = self.users.lock().await;
        Ok(users.values().cloned().collect())
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserId, TaskError> {
        let mut users = self.users.lock().await;

        if users.values().any(|existing| existing.username == user.username) {
            return Err(TaskError::DuplicateUsername(user.username));
        }

        let id = self.ids.generate_user_id();
        users.insert(id, user.into_user(id));
        debug!(user_id = %id, "user row inserted");
        Ok(id)
    }
}
