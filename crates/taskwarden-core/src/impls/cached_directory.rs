//! CachedUserDirectory - 台帳の read-through キャッシュ
//!
//! # 実装詳細
//! - id → User のキャッシュ、ミス時のみ下層へ読みに行く
//! - 「全件ロード済み」フラグで全件スキャンは一度だけ
//! - insert は同じ呼び出しの中で同期的にキャッシュへ書く（read-your-writes）。
//!   認可判定はこの読みに依存するため、ここが遅れると正しさが壊れる。

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::domain::{NewUser, TaskError, User, UserId};
use crate::ports::UserDirectory;

struct CacheState {
    users: HashMap<UserId, User>,
    loaded_all: bool,
}

/// Read-through cache wrapping any `UserDirectory`.
pub struct CachedUserDirectory<D> {
    inner: D,
    cache: Mutex<CacheState>,
}

impl<D: UserDirectory> CachedUserDirectory<D> {
    pub fn new(inner: D) -> Self {
        Self {
            inner,
            cache: Mutex::new(CacheState {
                users: HashMap::new(),
                loaded_all: false,
            }),
        }
    }
}

#[async_trait]
impl<D: UserDirectory> UserDirectory for CachedUserDirectory<D> {
    async fn find_by_id(&self, user_id: UserId) -> Result<Option<User>, TaskError> {
        {
            let cache = self.cache.lock().await;
            if let Some(user) = cache.users.get(&user_id) {
                return Ok(Some(user.clone()));
            }
        }

        let found = self.inner.find_by_id(user_id).await?;
        if let Some(user) = &found {
            let mut cache = self.cache.lock().await;
            cache.users.insert(user_id, user.clone());
        }
        Ok(found)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, TaskError> {
        {
            let cache = self.cache.lock().await;
            if let Some(user) = cache.users.values().find(|user| user.username == username) {
                return Ok(Some(user.clone()));
            }
        }

        let found = self.inner.find_by_username(username).await?;
        if let Some(user) = &found {
            let mut cache = self.cache.lock().await;
            cache.users.insert(user.user_id, user.clone());
        }
        Ok(found)
    }

    async fn all_users(&self) -> Result<Vec<User>, TaskError> {
        let mut cache = self.cache.lock().await;
        if !cache.loaded_all {
            for user in self.inner.all_users().await? {
                cache.users.insert(user.user_id, user);
            }
            cache.loaded_all = true;
        }
        Ok(cache.users.values().cloned().collect())
    }

    async fn insert_user(&self, user: NewUser) -> Result<UserId, TaskError> {
        let id = self.inner.insert_user(user.clone()).await?;

        // Write into the cache before returning, so a lookup in the same
        // logical session cannot miss the new user.
        let mut cache = self.cache.lock().await;
        cache.users.insert(id, user.into_user(id));
        Ok(id)
    }
}
