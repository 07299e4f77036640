//! TaskStore port - 現在行とリビジョンログの正本（source of truth）
//!
//! TaskStore は以下を管理します：
//! - 現在のタスク行（task_id ごとに高々 1 行）
//! - 追記専用のリビジョンログ（(task_id, revision) で一意）
//!
//! # 設計原則
//! - 行の永続化とリビジョン追記は同一クリティカルセクション内（atomic）。
//!   リビジョンのない行も、行のないリビジョン（CREATE）も不変条件違反。
//! - リビジョン番号の権威はここにある。「max を読んで +1 して追記」は
//!   同じ task_id への並行変更と直列化されなければならない。
//! - ログは task_id をキーに行の存在と独立して残る（DELETE 後も番号は継続）。

use async_trait::async_trait;

use crate::domain::{TaskDetails, TaskError, TaskId, TaskQuery, TaskRecord, TaskRevision, UserId};

/// TaskStore は現在のタスク行とリビジョンログの正本
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Persist a new task and its CREATE revision (revision 1) atomically.
    /// Returns the assigned id.
    async fn insert_task(
        &self,
        modified_by: UserId,
        details: TaskDetails,
    ) -> Result<TaskId, TaskError>;

    /// Replace the task's details wholesale and append the UPDATE revision
    /// atomically. Fails with `TaskNotFound` if the row is absent.
    async fn update_task(
        &self,
        modified_by: UserId,
        id: TaskId,
        details: TaskDetails,
    ) -> Result<(), TaskError>;

    /// Remove the current row and append the DELETE revision atomically,
    /// snapshotting the details as they were just before removal. Fails with
    /// `TaskNotFound` if the row is absent.
    async fn delete_task(&self, modified_by: UserId, id: TaskId) -> Result<(), TaskError>;

    async fn get_task_by_id(&self, id: TaskId) -> Result<Option<TaskRecord>, TaskError>;

    /// Current rows matching the filter, ordered by due date when the query
    /// asks for it.
    async fn get_tasks(&self, query: &TaskQuery) -> Result<Vec<TaskRecord>, TaskError>;

    /// All revisions for the id, ascending by revision number. Empty (not an
    /// error) if the task never existed.
    async fn get_task_history(&self, id: TaskId) -> Result<Vec<TaskRevision>, TaskError>;
}
