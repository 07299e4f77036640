//! AppBuilder - アプリケーションの構築とワイヤリング
//!
//! # 設計
//! - グローバルな DI コンテナは使わない。依存は composition root で明示的に
//!   組み立てて渡す。
//! - 起動時検証（Fail-fast 設計）: build() の時点で配線漏れを検出する。
//! - 管理者のブートストラップ（いなければ作る）も build() で行う。
//!
//! # 使用例
//! ```ignore
//! let app = AppBuilder::new()
//!     .in_memory()
//!     .with_admin_password_hash(hash)
//!     .build()
//!     .await?;
//! ```

use std::sync::Arc;

use crate::domain::TaskError;
use crate::impls::{CachedUserDirectory, InMemoryTaskStore, InMemoryUserDirectory};
use crate::ports::{Clock, IdGenerator, SystemClock, TaskStore, UlidGenerator, UserDirectory};
use crate::service::{TaskService, UserService};

/// BuildError はアプリケーション構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("no user directory configured")]
    MissingDirectory,

    #[error("no task store configured")]
    MissingStore,

    #[error("admin bootstrap failed: {0}")]
    AdminBootstrap(#[from] TaskError),
}

/// AppBuilder はアプリケーションを構築
pub struct AppBuilder {
    directory: Option<Arc<dyn UserDirectory>>,
    store: Option<Arc<dyn TaskStore>>,
    clock: Arc<dyn Clock>,
    admin_password_hash: Option<String>,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self {
            directory: None,
            store: None,
            clock: Arc::new(SystemClock),
            admin_password_hash: None,
        }
    }

    pub fn with_directory(mut self, directory: Arc<dyn UserDirectory>) -> Self {
        self.directory = Some(directory);
        self
    }

    pub fn with_store(mut self, store: Arc<dyn TaskStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Pre-hashed credential for the bootstrap admin. Without it, build()
    /// skips the bootstrap (useful for tests that seed their own users).
    pub fn with_admin_password_hash(mut self, password_hash: impl Into<String>) -> Self {
        self.admin_password_hash = Some(password_hash.into());
        self
    }

    /// Convenience wiring: cached in-memory directory + in-memory store,
    /// sharing the builder's clock.
    pub fn in_memory(self) -> Self {
        let ids: Arc<dyn IdGenerator> =
            Arc::new(UlidGenerator::new(Arc::clone(&self.clock)));
        let directory = Arc::new(CachedUserDirectory::new(InMemoryUserDirectory::new(
            Arc::clone(&ids),
        )));
        let store = Arc::new(InMemoryTaskStore::new(ids, Arc::clone(&self.clock)));
        self.with_directory(directory).with_store(store)
    }

    /// 検証とブートストラップを行い、App を生成
    pub async fn build(self) -> Result<App, BuildError> {
        let directory = self.directory.ok_or(BuildError::MissingDirectory)?;
        let store = self.store.ok_or(BuildError::MissingStore)?;

        let users = UserService::new(Arc::clone(&directory));
        let tasks = TaskService::new(store, directory, self.clock);

        if let Some(password_hash) = self.admin_password_hash {
            users.initialize_admin_user(password_hash).await?;
        }

        Ok(App { tasks, users })
    }
}

impl Default for AppBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// App はアプリケーションのランタイム
pub struct App {
    pub tasks: TaskService,
    pub users: UserService,
}
