//! Service - コアロジック
//!
//! # 主要コンポーネント
//! - **authorize**: 純粋な認可判定（リスト絞り込みと単体アクセスで同一の判定）
//! - **validate**: 順序付きのバリデーション（最初の失敗を返す）
//! - **TaskService**: 変更パイプライン（validate → authorize → persist → revision）
//! - **UserService**: ユーザー台帳操作と END_USER の役割不変条件

pub mod authorize;
pub mod tasks;
pub mod users;
pub mod validate;

pub use self::authorize::is_task_authorized;
pub use self::tasks::TaskService;
pub use self::users::UserService;
pub use self::validate::{DESCRIPTION_MAX_LEN, TITLE_MAX_LEN, validate_details};
