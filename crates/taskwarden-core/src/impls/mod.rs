//! Impls - ポートの実装
//!
//! 開発・テスト用のインメモリ実装と、台帳のキャッシュ層。
//! 本番の永続化実装（RDB など）は別クレートで同じポートを実装する想定。

pub mod cached_directory;
pub mod inmem_tasks;
pub mod inmem_users;

pub use self::cached_directory::CachedUserDirectory;
pub use self::inmem_tasks::InMemoryTaskStore;
pub use self::inmem_users::InMemoryUserDirectory;
